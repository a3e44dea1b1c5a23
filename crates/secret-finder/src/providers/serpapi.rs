use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{PageRequest, ProviderError, SearchPage, SearchProvider, SearchResult};

const BASE_URL: &str = "https://serpapi.com/search.json";

/// Google Maps engine of the SerpApi search service.
pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn request_url(&self, request: &PageRequest) -> Result<Url, ProviderError> {
        match request {
            PageRequest::Query(query) => Url::parse_with_params(
                &self.base_url,
                &[
                    ("engine", "google_maps"),
                    ("q", query.as_str()),
                    ("type", "search"),
                    ("api_key", self.api_key.as_str()),
                ],
            )
            .map_err(|err| ProviderError::Parse(err.to_string())),
            // Pagination links come back without credentials.
            PageRequest::Cursor(next) => {
                let mut url =
                    Url::parse(next).map_err(|err| ProviderError::Parse(err.to_string()))?;
                url.query_pairs_mut().append_pair("api_key", &self.api_key);
                Ok(url)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapsResponse {
    #[serde(default)]
    local_results: Vec<SearchResult>,
    #[serde(default)]
    serpapi_pagination: Option<MapsPagination>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapsPagination {
    #[serde(default)]
    next: Option<String>,
}

impl From<MapsResponse> for SearchPage {
    fn from(response: MapsResponse) -> Self {
        SearchPage {
            results: response.local_results,
            next_cursor: response
                .serpapi_pagination
                .and_then(|pagination| pagination.next)
                .filter(|next| !next.is_empty()),
            error: response.error,
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, request: PageRequest) -> Result<SearchPage, ProviderError> {
        let url = self.request_url(&request)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Errors are usually reported in-band as `{ "error": ... }`, sometimes
        // alongside a non-2xx status.
        match serde_json::from_str::<MapsResponse>(&body) {
            Ok(parsed) => Ok(parsed.into()),
            Err(_) if !status.is_success() => Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            }),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_page_url_carries_engine_query_and_key() {
        let client = SerpApiClient::new("secret");
        let url = client
            .request_url(&PageRequest::Query("Jewelry in Austin".to_string()))
            .expect("url builds");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(pairs.contains(&("engine".to_string(), "google_maps".to_string())));
        assert!(pairs.contains(&("q".to_string(), "Jewelry in Austin".to_string())));
        assert!(pairs.contains(&("api_key".to_string(), "secret".to_string())));
    }

    #[test]
    fn cursor_url_gets_key_appended() {
        let client = SerpApiClient::new("secret");
        let url = client
            .request_url(&PageRequest::Cursor(
                "https://serpapi.com/search.json?engine=google_maps&start=20".to_string(),
            ))
            .expect("url builds");

        assert_eq!(url.query_pairs().count(), 3);
        assert!(url.as_str().ends_with("api_key=secret"));
    }

    #[test]
    fn response_maps_results_cursor_and_error() {
        let parsed: MapsResponse = serde_json::from_value(json!({
            "local_results": [
                { "title": "Aurum NYC", "website": "https://www.aurum-nyc.com", "rating": 4.6, "phone": "+1 212" },
                { "title": "No Site" }
            ],
            "serpapi_pagination": { "next": "https://serpapi.com/search.json?start=20" }
        }))
        .expect("parse");
        let page = SearchPage::from(parsed);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].rating, Some(4.6));
        assert!(page.next_cursor.is_some());
        assert!(page.error.is_none());

        let errored: MapsResponse =
            serde_json::from_value(json!({ "error": "Invalid API key." })).expect("parse");
        let page = SearchPage::from(errored);
        assert!(page.results.is_empty());
        assert_eq!(page.error.as_deref(), Some("Invalid API key."));
    }
}
