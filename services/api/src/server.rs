use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use secret_finder::config::AppConfig;
use secret_finder::error::AppError;
use secret_finder::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::from_config(&config);
    let poller = config
        .watch
        .poll_interval()
        .map(|period| {
            info!(period_secs = period.as_secs(), "watchtower poller enabled");
            services.watchtower.clone().spawn_poller(period)
        });

    let app = with_application_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        state = %config.storage.state_path.display(),
        "secret finder ready"
    );

    let served = axum::serve(listener, app).await;
    if let Some(poller) = poller {
        poller.abort();
    }
    served?;
    Ok(())
}
