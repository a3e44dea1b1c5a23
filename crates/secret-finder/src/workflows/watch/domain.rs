use serde::{Deserialize, Serialize};

use crate::workflows::leads::Lead;

/// Persisted watchtower state: the tags under watch and every lead admitted so
/// far, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    #[serde(default)]
    pub monitored_tags: Vec<String>,
    #[serde(default)]
    pub leads: Vec<Lead>,
    /// Unix millis of the last write that admitted new leads.
    #[serde(default)]
    pub last_checked: i64,
    #[serde(default)]
    pub is_running: bool,
}

impl WatchState {
    /// True when `lead` shares an id or company name with a stored lead.
    pub fn contains(&self, lead: &Lead) -> bool {
        self.leads
            .iter()
            .any(|stored| stored.id == lead.id || stored.company_name == lead.company_name)
    }
}

/// `"#Diamonds "` becomes `"Diamonds"`; blank input yields `None`. Only one
/// leading `#` is stripped.
pub fn clean_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let cleaned = trimmed.strip_prefix('#').unwrap_or(trimmed);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Body of `POST /api/monitor`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorCommand {
    pub action: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    Start,
    Stop,
    AddTag(String),
    RemoveTag(String),
    Load,
    Scan { force: bool },
}

impl MonitorCommand {
    /// Resolves the action, or `None` when it is unknown or missing its tag.
    pub fn action(&self) -> Option<MonitorAction> {
        let tag = self.tag.as_deref().filter(|tag| !tag.is_empty());
        match (self.action.as_str(), tag) {
            ("start", _) => Some(MonitorAction::Start),
            ("stop", _) => Some(MonitorAction::Stop),
            ("add", Some(tag)) => Some(MonitorAction::AddTag(tag.to_string())),
            ("remove", Some(tag)) => Some(MonitorAction::RemoveTag(tag.to_string())),
            ("load", _) => Some(MonitorAction::Load),
            ("scan", _) => Some(MonitorAction::Scan { force: self.force }),
            _ => None,
        }
    }
}
