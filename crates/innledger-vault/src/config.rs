//! Vault configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use innledger_error::{LedgerError, Result};
use innledger_types::Tenant;

use crate::retry::RetryPolicy;

/// Everything the vault needs to know about one data directory.
///
/// Deserializes from TOML (the ops binary's `--config`) as well as JSON;
/// every field has a default so partial files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Data directory root.
    pub data_dir: PathBuf,
    /// Tenants the integrity checker and bootstrap cover.
    pub tenants: Vec<Tenant>,
    /// Timestamped backups retained per dataset+tenant.
    pub timestamped_backups: usize,
    /// Emergency snapshots retained per dataset+tenant.
    pub emergency_snapshots: usize,
    /// Access-log entries retained.
    pub access_log_cap: usize,
    /// Write retry bounds.
    pub retry: RetryPolicy,
    /// Whole-write-protocol deadline in milliseconds; exceeding it fails the
    /// save the same way retry exhaustion does.
    pub write_deadline_ms: u64,
    /// Background integrity-check interval in seconds.
    pub monitor_interval_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tenants: default_tenants(),
            timestamped_backups: 100,
            emergency_snapshots: 200,
            access_log_cap: 5000,
            retry: RetryPolicy::default(),
            write_deadline_ms: 15_000,
            monitor_interval_secs: 60,
        }
    }
}

impl VaultConfig {
    /// Defaults rooted at `data_dir` instead of `./data`.
    #[must_use]
    pub fn rooted_at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(LedgerError::config("data_dir must not be empty"));
        }
        if self.tenants.is_empty() {
            return Err(LedgerError::config("at least one tenant is required"));
        }
        if self.timestamped_backups == 0 {
            return Err(LedgerError::config("timestamped_backups must be >= 1"));
        }
        if self.emergency_snapshots == 0 {
            return Err(LedgerError::config("emergency_snapshots must be >= 1"));
        }
        if self.access_log_cap == 0 {
            return Err(LedgerError::config("access_log_cap must be >= 1"));
        }
        if self.write_deadline_ms == 0 {
            return Err(LedgerError::config("write_deadline_ms must be >= 1"));
        }
        if self.monitor_interval_secs == 0 {
            return Err(LedgerError::config("monitor_interval_secs must be >= 1"));
        }
        self.retry.validate()
    }

    #[must_use]
    pub fn write_deadline(&self) -> Duration {
        Duration::from_millis(self.write_deadline_ms)
    }

    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }
}

fn default_tenants() -> Vec<Tenant> {
    // Tenant::new only rejects ids with hostile characters; these literals
    // are fine, so the fallible path is unreachable.
    ["hotel1", "hotel2"]
        .into_iter()
        .filter_map(|id| Tenant::new(id).ok())
        .collect()
}
