use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{MonitorAction, MonitorCommand};
use super::service::{ScanOutcome, Watchtower};
use crate::error::AppError;
use crate::workflows::leads::{split_list, LeadFilter};

/// `/api/monitor` control surface plus a filtered view of stored leads.
pub fn watch_router(watchtower: Arc<Watchtower>) -> Router {
    Router::new()
        .route("/api/monitor", post(monitor_handler))
        .route("/api/monitor/leads", get(leads_handler))
        .with_state(watchtower)
}

pub(crate) async fn monitor_handler(
    State(watchtower): State<Arc<Watchtower>>,
    Json(command): Json<MonitorCommand>,
) -> Result<Response, AppError> {
    let Some(action) = command.action() else {
        let payload = json!({ "error": "Invalid Action" });
        return Ok((StatusCode::BAD_REQUEST, Json(payload)).into_response());
    };

    let response = match action {
        MonitorAction::Start => {
            watchtower.set_running(true).await?;
            Json(json!({ "success": true })).into_response()
        }
        MonitorAction::Stop => {
            watchtower.set_running(false).await?;
            Json(json!({ "success": true })).into_response()
        }
        MonitorAction::AddTag(tag) => {
            watchtower.add_tag(&tag).await?;
            Json(json!({ "success": true })).into_response()
        }
        MonitorAction::RemoveTag(tag) => {
            watchtower.remove_tag(&tag).await?;
            Json(json!({ "success": true })).into_response()
        }
        MonitorAction::Load => Json(watchtower.load_state().await?).into_response(),
        MonitorAction::Scan { force } => match watchtower.scan(force).await? {
            ScanOutcome::Paused => {
                Json(json!({ "success": false, "message": "Paused" })).into_response()
            }
            ScanOutcome::Completed { new_leads } => {
                Json(json!({ "success": true, "newLeads": new_leads })).into_response()
            }
        },
    };
    Ok(response)
}

/// Comma-separated query form of [`LeadFilter`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilterQuery {
    #[serde(default)]
    pub regions: Option<String>,
    #[serde(default)]
    pub business_types: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
}

impl From<LeadFilterQuery> for LeadFilter {
    fn from(query: LeadFilterQuery) -> Self {
        LeadFilter {
            regions: query.regions.as_deref().map(split_list).unwrap_or_default(),
            business_types: query
                .business_types
                .as_deref()
                .map(split_list)
                .unwrap_or_default(),
            keywords: query.keywords.unwrap_or_default(),
        }
    }
}

pub(crate) async fn leads_handler(
    State(watchtower): State<Arc<Watchtower>>,
    Query(query): Query<LeadFilterQuery>,
) -> Result<Response, AppError> {
    let filter = LeadFilter::from(query);
    let state = watchtower.load_state().await?;
    let leads = filter.apply(&state.leads);
    Ok(Json(leads).into_response())
}
