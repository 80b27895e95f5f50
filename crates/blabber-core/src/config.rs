//! Configuration for blabber
//!
//! Read from `blabber.toml`; every field is optional and a missing file
//! yields the defaults.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bail_invalid;
use crate::error::Result;

pub use types::{
    AggregatorConfig, BlabberConfig, StoreConfig, DEFAULT_DB_FILE, DEFAULT_INTERVAL_MS,
};

impl BlabberConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: BlabberConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path` if given and present, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.aggregator.interval_ms == 0 {
            bail_invalid!("aggregator.interval_ms", self.aggregator.interval_ms);
        }
        Ok(())
    }

    /// Resolve the database path: explicit config first, then the data directory
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.store.path {
            return path.clone();
        }

        dirs::data_dir()
            .map(|dir| dir.join("blabber").join(DEFAULT_DB_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
    }

    /// Pause between aggregation cycles
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.aggregator.interval_ms)
    }
}
