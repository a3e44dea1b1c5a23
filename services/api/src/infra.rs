use metrics_exporter_prometheus::PrometheusHandle;
use secret_finder::config::{AppConfig, FileKeyStore, KeyStore};
use secret_finder::providers::{HttpProviders, ProviderFactory};
use secret_finder::workflows::leads::LeadSearchService;
use secret_finder::workflows::outreach::OutreachLedger;
use secret_finder::workflows::watch::{
    DiscordWebhook, FileStateBackend, StateBackend, WatchStore, Watchtower,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Everything the routes and CLI commands operate on.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) keys: Arc<dyn KeyStore>,
    pub(crate) search: Arc<LeadSearchService>,
    pub(crate) watchtower: Arc<Watchtower>,
    pub(crate) outreach: Arc<OutreachLedger>,
}

impl Services {
    /// File-backed state and credentials, hosted providers, Discord alerts.
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        let keys: Arc<dyn KeyStore> = Arc::new(FileKeyStore::new(&config.storage.key_file_path));
        let backend: Arc<dyn StateBackend> =
            Arc::new(FileStateBackend::new(&config.storage.state_path));
        Self::assemble(config, keys, backend, Arc::new(HttpProviders))
    }

    pub(crate) fn assemble(
        config: &AppConfig,
        keys: Arc<dyn KeyStore>,
        backend: Arc<dyn StateBackend>,
        providers: Arc<dyn ProviderFactory>,
    ) -> Self {
        let search = LeadSearchService::new(
            keys.clone(),
            providers.clone(),
            config.search.max_pages,
            config.watch.hunt_results_limit,
        );
        let watchtower = Watchtower::new(
            Arc::new(WatchStore::new(backend)),
            keys.clone(),
            providers,
            Arc::new(DiscordWebhook::new()),
            config.watch.results_limit,
        );

        Self {
            keys,
            search: Arc::new(search),
            watchtower: Arc::new(watchtower),
            outreach: Arc::new(OutreachLedger::default()),
        }
    }
}
