use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::domain::Lead;
use super::pagination::SearchRequest;
use super::service::LeadSearchService;
use crate::error::AppError;

const DEFAULT_KEYWORD: &str = "Jewelry";
const DEFAULT_CITY: &str = "Local";
const DEFAULT_HASHTAG: &str = "diamond";

pub fn leads_router(service: Arc<LeadSearchService>) -> Router {
    Router::new()
        .route("/api/leads", get(search_handler))
        .route("/api/instagram", get(hunt_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl SearchQuery {
    pub fn into_request(self) -> SearchRequest {
        let or_default = |value: Option<String>, default: &str| {
            value
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        SearchRequest::from_lists(
            &or_default(self.keyword, DEFAULT_KEYWORD),
            &or_default(self.city, DEFAULT_CITY),
            self.country.as_deref().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HuntQuery {
    #[serde(default)]
    pub hashtag: Option<String>,
}

pub(crate) async fn search_handler(
    State(service): State<Arc<LeadSearchService>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let leads = service.search_leads(&query.into_request()).await?;
    Ok(Json(leads))
}

pub(crate) async fn hunt_handler(
    State(service): State<Arc<LeadSearchService>>,
    Query(query): Query<HuntQuery>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let tags = query
        .hashtag
        .filter(|tags| !tags.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HASHTAG.to_string());
    let leads = service.hunt_tags(&tags).await?;
    Ok(Json(leads))
}
