use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use super::domain::WatchState;
use super::notifier::{notify_all, Notifier};
use super::store::{StateBackend, WatchStore};
use crate::config::{current_keys, CredentialError, KeyStore};
use crate::providers::ProviderFactory;
use crate::workflows::leads::{leads_from_posts, Lead, TagContext, TagScan};

/// Result of one watch scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Paused,
    Completed { new_leads: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("watch state task failed: {0}")]
    Task(#[from] JoinError),
}

/// Incremental tag watching on top of the [`WatchStore`].
pub struct Watchtower {
    store: Arc<WatchStore<dyn StateBackend>>,
    keys: Arc<dyn KeyStore>,
    providers: Arc<dyn ProviderFactory>,
    notifier: Arc<dyn Notifier>,
    results_limit: u32,
    scan_gate: AsyncMutex<()>,
}

impl Watchtower {
    pub fn new(
        store: Arc<WatchStore<dyn StateBackend>>,
        keys: Arc<dyn KeyStore>,
        providers: Arc<dyn ProviderFactory>,
        notifier: Arc<dyn Notifier>,
        results_limit: u32,
    ) -> Self {
        Self {
            store,
            keys,
            providers,
            notifier,
            results_limit,
            scan_gate: AsyncMutex::new(()),
        }
    }

    /// Runs one store transaction on the blocking pool; backends do file I/O.
    async fn with_store<T, F>(&self, op: F) -> Result<T, WatchError>
    where
        T: Send + 'static,
        F: FnOnce(&WatchStore<dyn StateBackend>) -> T + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || op(&store)).await?)
    }

    pub async fn load_state(&self) -> Result<WatchState, WatchError> {
        self.with_store(|store| store.load_state()).await
    }

    pub async fn merge_leads(&self, batch: Vec<Lead>) -> Result<Vec<Lead>, WatchError> {
        self.with_store(move |store| store.merge_leads(batch)).await
    }

    pub async fn add_tag(&self, tag: &str) -> Result<bool, WatchError> {
        let tag = tag.to_string();
        self.with_store(move |store| store.add_tag(&tag)).await
    }

    pub async fn remove_tag(&self, tag: &str) -> Result<bool, WatchError> {
        let tag = tag.to_string();
        self.with_store(move |store| store.remove_tag(&tag)).await
    }

    pub async fn set_running(&self, running: bool) -> Result<(), WatchError> {
        info!(running, "watchtower toggled");
        self.with_store(move |store| store.set_running(running)).await
    }

    /// Scrapes every monitored tag, merges what is new and alerts on it.
    ///
    /// Credentials are checked first. A paused watchtower only scans when
    /// `force` is set. Scans never overlap.
    pub async fn scan(&self, force: bool) -> Result<ScanOutcome, WatchError> {
        let keys = current_keys(&self.keys).await?;
        let token = keys.require_apify()?;

        let _gate = self.scan_gate.lock().await;
        let state = self.load_state().await?;
        if !state.is_running && !force {
            debug!("watchtower paused; scan skipped");
            return Ok(ScanOutcome::Paused);
        }

        let scraper = self.providers.scrape_provider(token);
        let webhook = keys.discord_webhook.as_deref().filter(|url| !url.is_empty());
        let mut new_leads = 0;

        for tag in state.monitored_tags {
            let posts = match scraper.scrape_tag(&tag, self.results_limit).await {
                Ok(posts) => posts,
                Err(err) => {
                    warn!(tag = %tag, error = %err, "watch scan failed for tag");
                    continue;
                }
            };
            if posts.is_empty() {
                continue;
            }

            let context = TagContext {
                tag,
                scan: TagScan::Watch,
            };
            let inserted = self.merge_leads(leads_from_posts(posts, &context)).await?;
            if let Some(endpoint) = webhook {
                notify_all(self.notifier.as_ref(), endpoint, &inserted).await;
            }
            new_leads += inserted.len();
        }

        info!(new_leads, "watch scan finished");
        Ok(ScanOutcome::Completed { new_leads })
    }

    /// Runs a non-forced scan on every tick until the task is aborted.
    pub fn spawn_poller(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match self.scan(false).await {
                    Ok(ScanOutcome::Paused) => {}
                    Ok(ScanOutcome::Completed { new_leads }) => {
                        debug!(new_leads, "scheduled scan complete");
                    }
                    Err(err) => warn!(error = %err, "scheduled scan skipped"),
                }
            }
        })
    }
}
