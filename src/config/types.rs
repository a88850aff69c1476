use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::StorePolicy;

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Store timing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How often to check for pending server notifications (default: 10).
    #[serde(default = "default_auto_check_interval")]
    pub auto_check_interval_secs: u64,
    /// How often to fabricate a server notification (default: 15).
    #[serde(default = "default_auto_generate_interval")]
    pub auto_generate_interval_secs: u64,
    /// Delay before the startup reconciliation pass (default: 1000).
    #[serde(default = "default_reconcile_delay")]
    pub reconcile_delay_ms: u64,
    /// Title-match tolerance during reconciliation (default: 3000).
    #[serde(default = "default_dedup_window")]
    pub dedup_window_ms: u64,
    /// Start both timers once the store is loaded (default: true).
    #[serde(default = "default_auto_start_timers")]
    pub auto_start_timers: bool,
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
    /// Snapshot file; defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_auto_check_interval() -> u64 {
    10
}

fn default_auto_generate_interval() -> u64 {
    15
}

fn default_reconcile_delay() -> u64 {
    1000
}

fn default_dedup_window() -> u64 {
    3000
}

fn default_auto_start_timers() -> bool {
    true
}

fn default_persistence_enabled() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auto_check_interval_secs: default_auto_check_interval(),
            auto_generate_interval_secs: default_auto_generate_interval(),
            reconcile_delay_ms: default_reconcile_delay(),
            dedup_window_ms: default_dedup_window(),
            auto_start_timers: default_auto_start_timers(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_persistence_enabled(),
            path: None,
        }
    }
}

impl StoreConfig {
    pub fn to_policy(&self) -> StorePolicy {
        StorePolicy {
            auto_check_interval: Duration::from_secs(self.auto_check_interval_secs),
            auto_generate_interval: Duration::from_secs(self.auto_generate_interval_secs),
            reconcile_delay: Duration::from_millis(self.reconcile_delay_ms),
            dedup_window: Duration::from_millis(self.dedup_window_ms),
            auto_start_timers: self.auto_start_timers,
        }
    }
}
