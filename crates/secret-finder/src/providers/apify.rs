use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ensure_success, ProviderError, ScrapeProvider, ScrapedPost};

const BASE_URL: &str = "https://api.apify.com/v2";

/// apify/instagram-hashtag-scraper
const HASHTAG_SCRAPER: &str = "apify~instagram-hashtag-scraper";

#[derive(Debug, Serialize)]
struct HashtagInput<'a> {
    hashtags: [&'a str; 1],
    #[serde(rename = "resultsLimit")]
    results_limit: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RunData {
    id: String,
    status: String,
    #[serde(rename = "defaultDatasetId")]
    default_dataset_id: String,
}

/// Instagram hashtag scraping through Apify actor runs.
pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    async fn start_run(&self, tag: &str, limit: u32) -> Result<RunData, ProviderError> {
        let url = format!("{}/acts/{}/runs", self.base_url, HASHTAG_SCRAPER);
        let input = HashtagInput {
            hashtags: [tag],
            results_limit: limit,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;
        let run: ApiResponse<RunData> = ensure_success(response).await?.json().await?;
        Ok(run.data)
    }

    /// Long-polls the run with `waitForFinish=60` until it reaches a terminal state.
    async fn wait_for_run(&self, run_id: &str) -> Result<RunData, ProviderError> {
        loop {
            let url = format!("{}/actor-runs/{}?waitForFinish=60", self.base_url, run_id);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;
            let run: ApiResponse<RunData> = ensure_success(response).await?.json().await?;

            match run.data.status.as_str() {
                "SUCCEEDED" => return Ok(run.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ProviderError::RunFailed(run.data.status));
                }
                _ => debug!(run_id, status = %run.data.status, "apify run still in progress"),
            }
        }
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<ScrapedPost>, ProviderError> {
        let url = format!("{}/datasets/{}/items?format=json", self.base_url, dataset_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

#[async_trait]
impl ScrapeProvider for ApifyClient {
    async fn scrape_tag(&self, tag: &str, limit: u32) -> Result<Vec<ScrapedPost>, ProviderError> {
        info!(tag, limit, "starting hashtag scrape");
        let run = self.start_run(tag, limit).await?;
        let completed = self.wait_for_run(&run.id).await?;
        let posts = self.dataset_items(&completed.default_dataset_id).await?;
        info!(tag, count = posts.len(), "hashtag scrape finished");
        Ok(posts)
    }
}
