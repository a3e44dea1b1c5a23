use crate::infra::{AppState, Services};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use secret_finder::config::{current_keys, update_keys, KeyStore, KeyUpdate};
use secret_finder::error::AppError;
use secret_finder::workflows::leads::leads_router;
use secret_finder::workflows::outreach::outreach_router;
use secret_finder::workflows::watch::watch_router;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes(services: &Services) -> Router {
    leads_router(services.search.clone())
        .merge(watch_router(services.watchtower.clone()))
        .merge(outreach_router(services.outreach.clone()))
        .merge(settings_router(services.keys.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn settings_router(keys: Arc<dyn KeyStore>) -> Router {
    Router::new()
        .route("/api/settings", get(settings_view).post(settings_update))
        .with_state(keys)
}

/// Credentials as shown in the settings form. Secrets keep only their tail.
#[derive(Debug, Serialize)]
pub(crate) struct SettingsView {
    pub(crate) serpapi_key: String,
    pub(crate) apify_token: String,
    pub(crate) discord_webhook: String,
    #[serde(rename = "hasSerpApi")]
    pub(crate) has_serp_api: bool,
    #[serde(rename = "hasApify")]
    pub(crate) has_apify: bool,
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        None => String::new(),
        Some(secret) => {
            let chars: Vec<char> = secret.chars().collect();
            if chars.len() <= 4 {
                "*".repeat(chars.len())
            } else {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}{tail}", "*".repeat(chars.len() - 4))
            }
        }
    }
}

pub(crate) async fn settings_view(
    State(keys): State<Arc<dyn KeyStore>>,
) -> Result<Json<SettingsView>, AppError> {
    let keys = current_keys(&keys).await?;
    Ok(Json(SettingsView {
        serpapi_key: mask(keys.serpapi_key.as_deref()),
        apify_token: mask(keys.apify_token.as_deref()),
        discord_webhook: mask(keys.discord_webhook.as_deref()),
        has_serp_api: keys.serpapi_key.is_some(),
        has_apify: keys.apify_token.is_some(),
    }))
}

pub(crate) async fn settings_update(
    State(keys): State<Arc<dyn KeyStore>>,
    Json(update): Json<KeyUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    update_keys(&keys, update).await?;
    tracing::info!("settings updated");
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use secret_finder::config::{
        ApiKeys, AppConfig, AppEnvironment, LogFormat, MemoryKeyStore, SearchConfig, ServerConfig,
        StorageConfig, TelemetryConfig, WatchConfig,
    };
    use secret_finder::providers::HttpProviders;
    use secret_finder::workflows::watch::{MemoryStateBackend, StateBackend};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                format: LogFormat::Compact,
            },
            storage: StorageConfig {
                state_path: PathBuf::from("unused.json"),
                key_file_path: PathBuf::from("unused-keys.json"),
            },
            search: SearchConfig { max_pages: 2 },
            watch: WatchConfig {
                poll_secs: 0,
                results_limit: 3,
                hunt_results_limit: 10,
            },
        }
    }

    fn services(keys: ApiKeys) -> Services {
        let backend: Arc<dyn StateBackend> = Arc::new(MemoryStateBackend::default());
        Services::assemble(
            &config(),
            Arc::new(MemoryKeyStore::new(keys)),
            backend,
            Arc::new(HttpProviders),
        )
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[test]
    fn masks_all_but_the_tail() {
        assert_eq!(mask(Some("sk-1234567890")), "*********7890");
        assert_eq!(mask(Some("abc")), "***");
        assert_eq!(mask(None), "");
    }

    #[tokio::test]
    async fn settings_round_trip_through_the_router() {
        let app = with_application_routes(&services(ApiKeys::default()));

        let update = Request::builder()
            .method("POST")
            .uri("/api/settings")
            .header("content-type", "application/json")
            .body(Body::from(r#"{ "serpapi_key": "  serp-abcdef  " }"#))
            .expect("request");
        let response = app.clone().oneshot(update).await.expect("response");
        assert_eq!(json_body(response).await, json!({ "success": true }));

        let view = Request::builder()
            .uri("/api/settings")
            .body(Body::empty())
            .expect("request");
        let body = json_body(app.oneshot(view).await.expect("response")).await;
        assert_eq!(body["serpapi_key"], "*******cdef");
        assert_eq!(body["hasSerpApi"], true);
        assert_eq!(body["hasApify"], false);
        assert_eq!(body["apify_token"], "");
    }

    #[tokio::test]
    async fn lead_search_without_key_is_reported() {
        let app = with_application_routes(&services(ApiKeys::default()));

        let request = Request::builder()
            .uri("/api/leads?keyword=Jewelry&city=Austin")
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Missing SERPAPI_KEY. Add it in Settings.");
    }

    #[tokio::test]
    async fn outreach_log_is_listed_newest_first() {
        let app = with_application_routes(&services(ApiKeys::default()));

        for lead in ["lead-a", "lead-b"] {
            let request = Request::builder()
                .method("POST")
                .uri("/api/outreach")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "leadId": lead, "subject": "Hello", "body": "..." }).to_string(),
                ))
                .expect("request");
            let response = app.clone().oneshot(request).await.expect("response");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let list = Request::builder()
            .uri("/api/outreach")
            .body(Body::empty())
            .expect("request");
        let body = json_body(app.oneshot(list).await.expect("response")).await;
        assert_eq!(body[0]["leadId"], "lead-b");
        assert_eq!(body[1]["leadId"], "lead-a");
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
