use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Provider credentials and the webhook destination, resolved from the key
/// file with environment fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub serpapi_key: Option<String>,
    pub apify_token: Option<String>,
    pub discord_webhook: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self {
            serpapi_key: non_empty(env::var("SERPAPI_KEY").ok()),
            apify_token: non_empty(env::var("APIFY_TOKEN").ok()),
            discord_webhook: non_empty(env::var("DISCORD_WEBHOOK").ok()),
        }
    }

    pub fn require_serpapi(&self) -> Result<&str, CredentialError> {
        self.serpapi_key
            .as_deref()
            .ok_or(CredentialError::Missing("SERPAPI_KEY"))
    }

    pub fn require_apify(&self) -> Result<&str, CredentialError> {
        self.apify_token
            .as_deref()
            .ok_or(CredentialError::Missing("APIFY_TOKEN"))
    }

    /// Stored values win; blank stored values fall through to the defaults.
    fn overlay(stored: StoredKeys, defaults: &ApiKeys) -> Self {
        Self {
            serpapi_key: non_empty(stored.serpapi_key).or_else(|| defaults.serpapi_key.clone()),
            apify_token: non_empty(stored.apify_token).or_else(|| defaults.apify_token.clone()),
            discord_webhook: non_empty(stored.discord_webhook)
                .or_else(|| defaults.discord_webhook.clone()),
        }
    }
}

/// Operator-submitted settings. Absent fields leave the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyUpdate {
    #[serde(default)]
    pub serpapi_key: Option<String>,
    #[serde(default)]
    pub apify_token: Option<String>,
    #[serde(default)]
    pub discord_webhook: Option<String>,
}

/// Durable key/value store for credentials, consulted before every external call.
pub trait KeyStore: Send + Sync {
    fn keys(&self) -> ApiKeys;
    fn update(&self, update: KeyUpdate) -> Result<(), CredentialError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Missing {0}. Add it in Settings.")]
    Missing(&'static str),
    #[error("unable to access key file: {0}")]
    Io(#[from] std::io::Error),
    #[error("key file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("credential task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Reads the credentials on the blocking pool.
pub async fn current_keys(store: &Arc<dyn KeyStore>) -> Result<ApiKeys, CredentialError> {
    let store = Arc::clone(store);
    Ok(tokio::task::spawn_blocking(move || store.keys()).await?)
}

/// Applies a settings update on the blocking pool.
pub async fn update_keys(store: &Arc<dyn KeyStore>, update: KeyUpdate) -> Result<(), CredentialError> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || store.update(update)).await?
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serpapi_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    apify_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discord_webhook: Option<String>,
}

/// `keys.json`-backed credential store.
#[derive(Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    defaults: ApiKeys,
    write_lock: Mutex<()>,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_defaults(path, ApiKeys::from_env())
    }

    pub fn with_defaults(path: impl Into<PathBuf>, defaults: ApiKeys) -> Self {
        Self {
            path: path.into(),
            defaults,
            write_lock: Mutex::new(()),
        }
    }

    fn read_stored(&self) -> Result<StoredKeys, CredentialError> {
        if !self.path.exists() {
            return Ok(StoredKeys::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(StoredKeys::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

impl KeyStore for FileKeyStore {
    fn keys(&self) -> ApiKeys {
        let stored = match self.read_stored() {
            Ok(stored) => stored,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "falling back to environment credentials");
                StoredKeys::default()
            }
        };
        ApiKeys::overlay(stored, &self.defaults)
    }

    fn update(&self, update: KeyUpdate) -> Result<(), CredentialError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // An unreadable file is replaced rather than blocking the operator.
        let mut stored = self.read_stored().unwrap_or_default();
        if let Some(value) = update.serpapi_key {
            stored.serpapi_key = Some(value.trim().to_string());
        }
        if let Some(value) = update.apify_token {
            stored.apify_token = Some(value.trim().to_string());
        }
        if let Some(value) = update.discord_webhook {
            stored.discord_webhook = Some(value.trim().to_string());
        }

        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Process-local credentials, for wiring without a key file.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: Mutex<ApiKeys>,
}

impl MemoryKeyStore {
    pub fn new(keys: ApiKeys) -> Self {
        Self {
            keys: Mutex::new(keys),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn keys(&self) -> ApiKeys {
        self.keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, update: KeyUpdate) -> Result<(), CredentialError> {
        let mut keys = self
            .keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let trimmed = |value: String| non_empty(Some(value.trim().to_string()));
        if let Some(value) = update.serpapi_key {
            keys.serpapi_key = trimmed(value);
        }
        if let Some(value) = update.apify_token {
            keys.apify_token = trimmed(value);
        }
        if let Some(value) = update.discord_webhook {
            keys.discord_webhook = trimmed(value);
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
