use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::workflows::leads::Lead;

const BOT_NAME: &str = "Secret Finder Watchtower";
const EMBED_COLOR: u32 = 3_066_993;

/// Delivers a single new-lead alert to a webhook endpoint.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, endpoint: &str, lead: &Lead) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook transport failed: {0}")]
    Transport(String),
    #[error("webhook returned status {status}")]
    Rejected { status: u16 },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// Discord incoming webhook with one embed per lead.
#[derive(Debug, Clone, Default)]
pub struct DiscordWebhook {
    http: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(lead: &Lead) -> Value {
        json!({
            "username": BOT_NAME,
            "embeds": [{
                "title": format!("New Lead: @{}", lead.company_name),
                "url": lead.website,
                "color": EMBED_COLOR,
                "fields": [
                    { "name": "Source", "value": lead.business_type.as_str(), "inline": true },
                    { "name": "Score", "value": format!("{}/100", lead.score), "inline": true },
                    {
                        "name": "Content",
                        "value": lead
                            .notes
                            .as_deref()
                            .filter(|notes| !notes.is_empty())
                            .unwrap_or("No caption"),
                    },
                ],
                "footer": { "text": "Secret Finder" },
                "timestamp": Utc::now().to_rfc3339(),
            }],
        })
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, endpoint: &str, lead: &Lead) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(endpoint)
            .json(&Self::payload(lead))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "webhook returned non-success");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Sends one alert per lead in order. Failures are logged and skipped; the
/// number delivered is returned.
pub async fn notify_all<N>(notifier: &N, endpoint: &str, leads: &[Lead]) -> usize
where
    N: Notifier + ?Sized,
{
    if leads.is_empty() {
        return 0;
    }
    info!(count = leads.len(), "sending new-lead alerts");

    let mut delivered = 0;
    for lead in leads {
        match notifier.send(endpoint, lead).await {
            Ok(()) => delivered += 1,
            Err(err) => warn!(lead = %lead.id, error = %err, "alert delivery failed"),
        }
    }
    delivered
}
