use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::{ApiKeys, MemoryKeyStore};
use crate::providers::{
    PageRequest, ProviderError, ProviderFactory, ScrapeProvider, ScrapedPost, SearchPage,
    SearchProvider,
};
use crate::workflows::leads::{BusinessType, EmailVerificationStatus, Lead};
use crate::workflows::watch::notifier::{Notifier, NotifyError};
use crate::workflows::watch::store::{StateBackend, StoreError, WatchStore};
use crate::workflows::watch::{WatchState, Watchtower};

pub(super) const WEBHOOK: &str = "https://hooks.test/watchtower";

pub(super) fn lead(id: &str, company: &str) -> Lead {
    Lead {
        id: id.to_string(),
        company_name: company.to_string(),
        website: format!("https://instagram.com/{company}"),
        country: "Global".to_string(),
        region: "Instagram".to_string(),
        business_type: BusinessType::Other("#gold".to_string()),
        contact_name: company.to_string(),
        contact_role: "Owner".to_string(),
        raw_email: None,
        domain: "instagram.com".to_string(),
        predicted_email: None,
        email_verification_status: EmailVerificationStatus::Unknown,
        score: 90,
        notes: None,
    }
}

pub(super) fn post(id: &str, owner: &str, caption: &str) -> ScrapedPost {
    ScrapedPost {
        id: Some(id.to_string()),
        owner_username: Some(owner.to_string()),
        caption: Some(caption.to_string()),
        ..ScrapedPost::default()
    }
}

pub(super) fn keys(apify: bool, webhook: bool) -> ApiKeys {
    ApiKeys {
        serpapi_key: None,
        apify_token: apify.then(|| "apify-test-token".to_string()),
        discord_webhook: webhook.then(|| WEBHOOK.to_string()),
    }
}

/// Scraper with canned posts per tag. Tags in `failing` error out.
#[derive(Default)]
pub(super) struct FakeScraper {
    pub(super) posts: HashMap<String, Vec<ScrapedPost>>,
    pub(super) failing: Vec<String>,
    pub(super) calls: Mutex<Vec<(String, u32)>>,
}

impl FakeScraper {
    pub(super) fn with_tag(mut self, tag: &str, posts: Vec<ScrapedPost>) -> Self {
        self.posts.insert(tag.to_string(), posts);
        self
    }

    pub(super) fn failing(mut self, tag: &str) -> Self {
        self.failing.push(tag.to_string());
        self
    }

    pub(super) fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl ScrapeProvider for FakeScraper {
    async fn scrape_tag(&self, tag: &str, limit: u32) -> Result<Vec<ScrapedPost>, ProviderError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((tag.to_string(), limit));
        if self.failing.iter().any(|failing| failing == tag) {
            return Err(ProviderError::RunFailed("FAILED".to_string()));
        }
        Ok(self.posts.get(tag).cloned().unwrap_or_default())
    }
}

struct NoSearch;

#[async_trait]
impl SearchProvider for NoSearch {
    async fn search(&self, _request: PageRequest) -> Result<SearchPage, ProviderError> {
        Ok(SearchPage::default())
    }
}

pub(super) struct FakeProviders {
    pub(super) scraper: Arc<FakeScraper>,
}

impl ProviderFactory for FakeProviders {
    fn search_provider(&self, _api_key: &str) -> Arc<dyn SearchProvider> {
        Arc::new(NoSearch)
    }

    fn scrape_provider(&self, _token: &str) -> Arc<dyn ScrapeProvider> {
        self.scraper.clone()
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// `(endpoint, lead id)` pairs in delivery order.
    pub(super) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, endpoint: &str, lead: &Lead) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push((endpoint.to_string(), lead.id.clone()));
        Ok(())
    }
}

/// Every read and write fails.
pub(super) struct BrokenBackend;

impl StateBackend for BrokenBackend {
    fn read(&self) -> Result<Option<WatchState>, StoreError> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read denied").into())
    }

    fn write(&self, _state: &WatchState) -> Result<(), StoreError> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "write denied").into())
    }
}

pub(super) struct Harness {
    pub(super) watchtower: Arc<Watchtower>,
    pub(super) scraper: Arc<FakeScraper>,
    pub(super) notifier: Arc<RecordingNotifier>,
}

pub(super) fn harness(
    backend: Arc<dyn StateBackend>,
    api_keys: ApiKeys,
    scraper: FakeScraper,
) -> Harness {
    let scraper = Arc::new(scraper);
    let notifier = Arc::new(RecordingNotifier::default());
    let watchtower = Watchtower::new(
        Arc::new(WatchStore::new(backend)),
        Arc::new(MemoryKeyStore::new(api_keys)),
        Arc::new(FakeProviders {
            scraper: scraper.clone(),
        }),
        notifier.clone(),
        3,
    );
    Harness {
        watchtower: Arc::new(watchtower),
        scraper,
        notifier,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
