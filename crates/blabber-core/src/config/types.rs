//! Configuration type definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File name of the default database inside the data directory
pub const DEFAULT_DB_FILE: &str = "blabber.db";

/// Default pause between two aggregation cycles
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Top-level blabber configuration (`blabber.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlabberConfig {
    /// Post and tag count storage
    #[serde(default)]
    pub store: StoreConfig,

    /// Background tag aggregation
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

/// Where posts and tag counts live
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path (optional, defaults to the user data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Background aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Run the background aggregator during interactive sessions
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Sleep between cycles, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            enabled: default_enabled(),
            interval_ms: default_interval_ms(),
        }
    }
}
