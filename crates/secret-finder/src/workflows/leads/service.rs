use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::Lead;
use super::normalizer::{TagContext, TagScan};
use super::pagination::{split_list, PaginationDriver, SearchRequest};
use crate::config::{current_keys, CredentialError, KeyStore};
use crate::providers::ProviderFactory;
use crate::workflows::watch::clean_tag;

/// One-shot lead discovery: bulk maps search and social tag hunts. Nothing is
/// persisted.
pub struct LeadSearchService {
    keys: Arc<dyn KeyStore>,
    providers: Arc<dyn ProviderFactory>,
    max_pages: usize,
    hunt_results_limit: u32,
}

impl LeadSearchService {
    pub fn new(
        keys: Arc<dyn KeyStore>,
        providers: Arc<dyn ProviderFactory>,
        max_pages: usize,
        hunt_results_limit: u32,
    ) -> Self {
        Self {
            keys,
            providers,
            max_pages,
            hunt_results_limit,
        }
    }

    /// Searches every (location, term) pair, deduplicated by company name.
    pub async fn search_leads(&self, request: &SearchRequest) -> Result<Vec<Lead>, CredentialError> {
        let keys = current_keys(&self.keys).await?;
        let api_key = keys.require_serpapi()?;
        let driver = PaginationDriver::new(self.providers.search_provider(api_key), self.max_pages);

        info!(
            terms = request.terms.len(),
            locations = request.locations.len(),
            max_pages = driver.max_pages(),
            "bulk search started"
        );
        Ok(driver.search_leads(request).await)
    }

    /// Scrapes each distinct comma-separated tag once. A failing tag is logged
    /// and contributes nothing.
    pub async fn hunt_tags(&self, tags: &str) -> Result<Vec<Lead>, CredentialError> {
        let keys = current_keys(&self.keys).await?;
        let token = keys.require_apify()?;
        let scraper = self.providers.scrape_provider(token);
        let started_at_millis = Utc::now().timestamp_millis();

        let mut tags_seen = Vec::new();
        for tag in split_list(tags).iter().filter_map(|tag| clean_tag(tag)) {
            if !tags_seen.contains(&tag) {
                tags_seen.push(tag);
            }
        }

        let mut leads = Vec::new();
        for tag in tags_seen {
            info!(tag = %tag, "tag hunt scanning");
            let posts = match scraper.scrape_tag(&tag, self.hunt_results_limit).await {
                Ok(posts) => posts,
                Err(err) => {
                    warn!(tag = %tag, error = %err, "tag hunt failed");
                    continue;
                }
            };
            let context = TagContext {
                tag,
                scan: TagScan::Hunt { started_at_millis },
            };
            leads.extend(super::leads_from_posts(posts, &context));
        }
        Ok(leads)
    }
}
