use super::common::*;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::config::CredentialError;
use crate::workflows::watch::store::{MemoryStateBackend, StateBackend, StoreError};
use crate::workflows::watch::{ScanOutcome, WatchError, WatchState};

fn backend(tags: &[&str], running: bool) -> Arc<dyn StateBackend> {
    Arc::new(MemoryStateBackend::with_state(WatchState {
        monitored_tags: tags.iter().map(|tag| tag.to_string()).collect(),
        is_running: running,
        ..WatchState::default()
    }))
}

fn gold_scraper() -> FakeScraper {
    FakeScraper::default().with_tag(
        "gold",
        vec![
            post("p1", "aurum_house", "Bespoke bands, email studio@aurum.house"),
            post("p2", "carat_club", "New arrivals"),
        ],
    )
}

#[tokio::test]
async fn scan_requires_scraper_token() {
    let harness = harness(backend(&["gold"], true), keys(false, true), gold_scraper());

    match harness.watchtower.scan(true).await {
        Err(WatchError::Credential(CredentialError::Missing("APIFY_TOKEN"))) => {}
        other => panic!("expected missing token, got {other:?}"),
    }
    assert!(harness.scraper.calls().is_empty());
}

#[tokio::test]
async fn paused_watchtower_skips_unless_forced() {
    let harness = harness(backend(&["gold"], false), keys(true, false), gold_scraper());

    let paused = harness.watchtower.scan(false).await.expect("scan");
    assert_eq!(paused, ScanOutcome::Paused);
    assert!(harness.scraper.calls().is_empty());

    let forced = harness.watchtower.scan(true).await.expect("scan");
    assert_eq!(forced, ScanOutcome::Completed { new_leads: 2 });
}

#[tokio::test]
async fn scan_merges_alerts_and_skips_failing_tags() {
    let scraper = gold_scraper().failing("silver");
    let harness = harness(backend(&["silver", "gold"], true), keys(true, true), scraper);

    let outcome = harness.watchtower.scan(false).await.expect("scan");

    assert_eq!(outcome, ScanOutcome::Completed { new_leads: 2 });
    assert_eq!(
        harness.scraper.calls(),
        vec![("silver".to_string(), 3), ("gold".to_string(), 3)]
    );

    let state = harness.watchtower.load_state().await.expect("state");
    assert_eq!(state.leads.len(), 2);
    assert_eq!(state.leads[0].id, "watch-gold-p2");
    assert_eq!(state.leads[1].raw_email.as_deref(), Some("studio@aurum.house"));

    let sent = harness.notifier.sent();
    assert_eq!(
        sent,
        vec![
            (WEBHOOK.to_string(), "watch-gold-p1".to_string()),
            (WEBHOOK.to_string(), "watch-gold-p2".to_string()),
        ]
    );
}

#[tokio::test]
async fn rescanning_the_same_posts_finds_nothing_new() {
    let harness = harness(backend(&["gold"], true), keys(true, true), gold_scraper());

    harness.watchtower.scan(false).await.expect("first scan");
    let second = harness.watchtower.scan(false).await.expect("second scan");

    assert_eq!(second, ScanOutcome::Completed { new_leads: 0 });
    assert_eq!(harness.notifier.sent().len(), 2);
}

#[tokio::test]
async fn no_webhook_means_no_alerts() {
    let harness = harness(backend(&["gold"], true), keys(true, false), gold_scraper());

    harness.watchtower.scan(false).await.expect("scan");

    assert!(harness.notifier.sent().is_empty());
    assert_eq!(harness.watchtower.load_state().await.expect("state").leads.len(), 2);
}

#[tokio::test]
async fn poller_scans_on_each_tick() {
    let harness = harness(backend(&["gold"], true), keys(true, false), gold_scraper());

    let handle = harness
        .watchtower
        .clone()
        .spawn_poller(Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.abort();

    assert!(harness.scraper.calls().len() >= 2);
    assert_eq!(harness.watchtower.load_state().await.expect("state").leads.len(), 2);
}

/// Remembers which threads touched the backend.
#[derive(Default)]
struct ThreadRecordingBackend {
    inner: MemoryStateBackend,
    threads: Mutex<Vec<ThreadId>>,
}

impl ThreadRecordingBackend {
    fn record(&self) {
        self.threads
            .lock()
            .expect("threads mutex poisoned")
            .push(thread::current().id());
    }
}

impl StateBackend for ThreadRecordingBackend {
    fn read(&self) -> Result<Option<WatchState>, StoreError> {
        self.record();
        self.inner.read()
    }

    fn write(&self, state: &WatchState) -> Result<(), StoreError> {
        self.record();
        self.inner.write(state)
    }
}

#[tokio::test]
async fn store_io_stays_off_the_async_worker() {
    let backend = Arc::new(ThreadRecordingBackend::default());
    let harness = harness(backend.clone(), keys(true, false), gold_scraper());

    harness.watchtower.add_tag("gold").await.expect("add tag");
    harness.watchtower.set_running(true).await.expect("toggle");
    harness.watchtower.scan(false).await.expect("scan");

    let worker = thread::current().id();
    let threads = backend.threads.lock().expect("threads mutex poisoned");
    assert!(!threads.is_empty());
    assert!(threads.iter().all(|id| *id != worker));
}
