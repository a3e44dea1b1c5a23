use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::Lead;
use super::normalizer::{RawRecord, SearchContext};
use crate::providers::{PageRequest, SearchProvider};

pub const DEFAULT_MAX_PAGES: usize = 2;

/// Terms × locations for one bulk search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub terms: Vec<String>,
    pub locations: Vec<String>,
    pub country: String,
}

impl SearchRequest {
    /// Builds a request from comma-separated lists, e.g. `"Jewelry, Gold"`.
    pub fn from_lists(terms: &str, locations: &str, country: &str) -> Self {
        Self {
            terms: split_list(terms),
            locations: split_list(locations),
            country: country.trim().to_string(),
        }
    }

    fn query(&self, term: &str, location: &str) -> String {
        format!("{term} in {location} {}", self.country)
            .trim()
            .to_string()
    }
}

/// Splits a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Walks provider pages for every (location, term) pair under a page ceiling.
pub struct PaginationDriver<P: ?Sized> {
    provider: Arc<P>,
    max_pages: usize,
}

impl<P> PaginationDriver<P>
where
    P: SearchProvider + ?Sized,
{
    pub fn new(provider: Arc<P>, max_pages: usize) -> Self {
        Self {
            provider,
            max_pages: max_pages.max(1),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Runs the whole cross product and returns leads deduplicated by company
    /// name. A failing pair contributes nothing; the others still run.
    pub async fn search_leads(&self, request: &SearchRequest) -> Vec<Lead> {
        let mut collected = Vec::new();

        for location in &request.locations {
            for term in &request.terms {
                let context = SearchContext {
                    term: term.clone(),
                    city: location.clone(),
                    country: request.country.clone(),
                    page: 0,
                };
                let query = request.query(term, location);
                let found = self.search_pair(&query, context).await;
                info!(query = %query, leads = found.len(), "search pair finished");
                collected.extend(found);
            }
        }

        dedup_by_company_name(collected)
    }

    async fn search_pair(&self, query: &str, mut context: SearchContext) -> Vec<Lead> {
        let mut leads = Vec::new();
        let mut request = PageRequest::Query(query.to_string());

        for page in 0..self.max_pages {
            context.page = page;
            let response = match self.provider.search(request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(query = %query, page, error = %err, "search provider call failed");
                    break;
                }
            };

            if let Some(message) = response.error {
                warn!(query = %query, page, error = %message, "search provider reported an error");
                break;
            }
            if response.results.is_empty() {
                debug!(query = %query, page, "no more results");
                break;
            }

            leads.extend(response.results.into_iter().enumerate().filter_map(
                |(index, result)| {
                    super::ingest(
                        RawRecord::SearchResult {
                            result,
                            context: &context,
                        },
                        index,
                    )
                },
            ));

            match response.next_cursor {
                Some(cursor) => request = PageRequest::Cursor(cursor),
                None => break,
            }
        }

        leads
    }
}

/// Collapses leads sharing a company name. The last occurrence wins but keeps
/// the slot of the first.
pub fn dedup_by_company_name(leads: Vec<Lead>) -> Vec<Lead> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Lead> = Vec::with_capacity(leads.len());

    for lead in leads {
        match positions.get(&lead.company_name) {
            Some(&slot) => unique[slot] = lead,
            None => {
                positions.insert(lead.company_name.clone(), unique.len());
                unique.push(lead);
            }
        }
    }

    unique
}
