//! External search and scraping collaborators.
//!
//! The lead pipeline only sees the traits and payload types defined here; the
//! HTTP adapters in [`serpapi`] and [`apify`] are thin wrappers over the hosted
//! APIs.

pub mod apify;
pub mod serpapi;

pub use apify::ApifyClient;
pub use serpapi::SerpApiClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

/// Which page of a maps search to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page for a free-text query.
    Query(String),
    /// Follow-up page identified by a provider-supplied cursor.
    Cursor(String),
}

/// A single maps-search hit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// One page of search results. Providers may report an error in-band instead
/// of failing the call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    pub next_cursor: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostOwner {
    #[serde(default)]
    pub username: Option<String>,
}

/// A scraped social-media post.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedPost {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub owner_username: Option<String>,
    #[serde(default)]
    pub owner: Option<PostOwner>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub likes_count: Option<i64>,
}

impl ScrapedPost {
    pub fn handle(&self) -> Option<&str> {
        let nested = self.owner.as_ref().and_then(|owner| owner.username.as_deref());
        [self.owner_username.as_deref(), nested]
            .into_iter()
            .flatten()
            .find(|handle| !handle.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(raw)) if !raw.is_empty() => Some(raw),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: PageRequest) -> Result<SearchPage, ProviderError>;
}

#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    async fn scrape_tag(&self, tag: &str, limit: u32) -> Result<Vec<ScrapedPost>, ProviderError>;
}

/// Builds provider clients from credentials looked up right before each call.
pub trait ProviderFactory: Send + Sync {
    fn search_provider(&self, api_key: &str) -> Arc<dyn SearchProvider>;
    fn scrape_provider(&self, token: &str) -> Arc<dyn ScrapeProvider>;
}

/// Hosted SerpApi and Apify endpoints.
#[derive(Debug, Clone, Default)]
pub struct HttpProviders;

impl ProviderFactory for HttpProviders {
    fn search_provider(&self, api_key: &str) -> Arc<dyn SearchProvider> {
        Arc::new(SerpApiClient::new(api_key))
    }

    fn scrape_provider(&self, token: &str) -> Arc<dyn ScrapeProvider> {
        Arc::new(ApifyClient::new(token))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected provider payload: {0}")]
    Parse(String),
    #[error("provider run finished with status {0}")]
    RunFailed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

/// Turn a non-2xx response into [`ProviderError::Api`], keeping the body.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}
