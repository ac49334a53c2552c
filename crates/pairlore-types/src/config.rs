//! Global configuration types for Pairlore.
//!
//! `PairloreConfig` represents the top-level `config.toml` that controls
//! the retention interval and moderation search behavior.

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Top-level configuration for the Pairlore bot.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairloreConfig {
    /// Hours a chat's learned data is kept once queued for eviction.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,

    /// Maximum number of words a moderation prefix search returns.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_retention_hours() -> u64 {
    12
}

fn default_search_limit() -> u32 {
    10
}

impl PairloreConfig {
    /// The retention interval as a `Duration`.
    pub fn retention_interval(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 60 * 60)
    }
}

impl Default for PairloreConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
            search_limit: default_search_limit(),
        }
    }
}
