//! Library-level configuration structs.
//!
//! Plain serde structs with defaults; loading them from files or the
//! environment is the embedding application's concern.

use serde::{Deserialize, Serialize};

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory holding one SQLite file per tenant.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Background embedding scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether the background scheduler runs at all.
    pub enabled: bool,

    /// Seconds between cycles.
    pub interval_secs: u64,

    /// Maximum documents processed per cycle, shared across all tenants
    /// and collections.
    pub cycle_cap: usize,

    /// Per-document embedding call timeout in seconds.
    pub embed_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            cycle_cap: default_cycle_cap(),
            embed_timeout_secs: default_embed_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    10
}

fn default_cycle_cap() -> usize {
    15
}

fn default_embed_timeout_secs() -> u64 {
    30
}

// ============================================================================
// Tests
// ============================================================================
