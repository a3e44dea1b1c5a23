//! Lead ingestion for the Secret Finder dashboard: bulk maps search, tag hunts,
//! and the watchtower that keeps scanning monitored tags for new prospects.

pub mod config;
pub mod error;
pub mod providers;
pub mod telemetry;
pub mod workflows;
