//! Simulated outreach: nothing is sent, each attempt is only logged in memory.

use std::sync::{Arc, Mutex, PoisonError};

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// What the operator composed for a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachDraft {
    pub lead_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub email_used: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachLog {
    pub id: String,
    pub sent_at: DateTime<Utc>,
    #[serde(flatten)]
    pub draft: OutreachDraft,
}

/// Newest-first log of simulated sends.
#[derive(Debug, Default)]
pub struct OutreachLedger {
    entries: Mutex<Vec<OutreachLog>>,
}

impl OutreachLedger {
    pub fn record(&self, draft: OutreachDraft) -> OutreachLog {
        let entry = OutreachLog {
            id: Uuid::new_v4().to_string(),
            sent_at: Utc::now(),
            draft,
        };
        info!(lead = %entry.draft.lead_id, id = %entry.id, "outreach logged (simulated)");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, entry.clone());
        entry
    }

    pub fn entries(&self) -> Vec<OutreachLog> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub fn outreach_router(ledger: Arc<OutreachLedger>) -> Router {
    Router::new()
        .route("/api/outreach", get(list_handler).post(record_handler))
        .with_state(ledger)
}

async fn record_handler(
    State(ledger): State<Arc<OutreachLedger>>,
    Json(draft): Json<OutreachDraft>,
) -> Json<Value> {
    let log = ledger.record(draft);
    Json(json!({ "success": true, "log": log }))
}

async fn list_handler(State(ledger): State<Arc<OutreachLedger>>) -> Json<Vec<OutreachLog>> {
    Json(ledger.entries())
}
