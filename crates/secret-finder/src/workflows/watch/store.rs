use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{clean_tag, WatchState};
use crate::workflows::leads::Lead;

/// Durable home of the watch state. `read` returns `None` when nothing has been
/// stored yet.
pub trait StateBackend: Send + Sync {
    fn read(&self) -> Result<Option<WatchState>, StoreError>;
    fn write(&self, state: &WatchState) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pretty-printed JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileStateBackend {
    path: PathBuf,
}

impl FileStateBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateBackend for FileStateBackend {
    fn read(&self) -> Result<Option<WatchState>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "seeding empty watch state");
                self.write(&WatchState::default())?;
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write(&self, state: &WatchState) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}

/// In-process backend that also counts writes.
#[derive(Debug, Default)]
pub struct MemoryStateBackend {
    state: Mutex<Option<WatchState>>,
    writes: AtomicUsize,
}

impl MemoryStateBackend {
    pub fn with_state(state: WatchState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl StateBackend for MemoryStateBackend {
    fn read(&self) -> Result<Option<WatchState>, StoreError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.clone())
    }

    fn write(&self, state: &WatchState) -> Result<(), StoreError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sole owner of the watch state. Every read-modify-write cycle runs under one
/// mutex; backend failures never reach callers.
pub struct WatchStore<B: ?Sized> {
    backend: Arc<B>,
    cycle: Mutex<()>,
}

impl<B> WatchStore<B>
where
    B: StateBackend + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            cycle: Mutex::new(()),
        }
    }

    pub fn load_state(&self) -> WatchState {
        let _cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        self.read()
    }

    /// Admits leads not yet seen by id or company name, prepending them newest
    /// first. Returns what was admitted, in batch order.
    pub fn merge_leads(&self, batch: Vec<Lead>) -> Vec<Lead> {
        self.transact(|state| {
            let mut inserted = Vec::new();
            for lead in batch {
                if state.contains(&lead) {
                    debug!(id = %lead.id, company = %lead.company_name, "duplicate lead skipped");
                    continue;
                }
                state.leads.insert(0, lead.clone());
                inserted.push(lead);
            }
            if !inserted.is_empty() {
                state.last_checked = Utc::now().timestamp_millis();
            }
            let changed = !inserted.is_empty();
            (inserted, changed)
        })
    }

    /// Returns whether the tag list changed.
    pub fn add_tag(&self, raw: &str) -> bool {
        let Some(tag) = clean_tag(raw) else {
            return false;
        };
        self.transact(|state| {
            if state.monitored_tags.contains(&tag) {
                return (false, false);
            }
            state.monitored_tags.push(tag);
            (true, true)
        })
    }

    pub fn remove_tag(&self, tag: &str) -> bool {
        self.transact(|state| {
            let before = state.monitored_tags.len();
            state.monitored_tags.retain(|existing| existing != tag);
            let changed = state.monitored_tags.len() != before;
            (changed, changed)
        })
    }

    pub fn set_running(&self, running: bool) {
        self.transact(|state| {
            let changed = state.is_running != running;
            state.is_running = running;
            ((), changed)
        });
    }

    /// Runs `mutate` against the current state and persists it when the closure
    /// reports a change.
    fn transact<T>(&self, mutate: impl FnOnce(&mut WatchState) -> (T, bool)) -> T {
        let _cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.read();
        let (outcome, changed) = mutate(&mut state);
        if changed {
            if let Err(err) = self.backend.write(&state) {
                warn!(error = %err, "failed to persist watch state; update lost");
            }
        }
        outcome
    }

    fn read(&self) -> WatchState {
        match self.backend.read() {
            Ok(state) => state.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "failed to read watch state; using defaults");
                WatchState::default()
            }
        }
    }
}
