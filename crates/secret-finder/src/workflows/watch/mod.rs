//! Watchtower: monitored tags are scraped repeatedly, new leads are admitted
//! through the dedup store and announced over a webhook.

pub mod domain;
pub mod notifier;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{clean_tag, MonitorAction, MonitorCommand, WatchState};
pub use notifier::{notify_all, DiscordWebhook, Notifier, NotifyError};
pub use router::{watch_router, LeadFilterQuery};
pub use service::{ScanOutcome, WatchError, Watchtower};
pub use store::{FileStateBackend, MemoryStateBackend, StateBackend, StoreError, WatchStore};
