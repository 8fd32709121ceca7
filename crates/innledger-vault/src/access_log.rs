//! Append-only record of mutating operations.
//!
//! Every successful save and every repair that copied data back over a
//! primary file appends one entry to `access_log.json`. The log is an
//! observability aid, not a ledger of record: appends are best-effort and a
//! failure to write the log never fails the operation that produced it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use innledger_error::{LedgerError, Result};
use innledger_store::{DataLayout, read_value, write_atomic};
use innledger_types::{DatasetKind, Tenant};

/// What a log entry records having happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Save,
    Repair,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Save => f.write_str("save"),
            Self::Repair => f.write_str("repair"),
        }
    }
}

/// One access-log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Local wall-clock time, microsecond precision.
    pub timestamp: String,
    pub operation: Operation,
    pub dataset: String,
    pub tenant: String,
}

impl AccessLogEntry {
    #[must_use]
    pub fn now(operation: Operation, dataset: DatasetKind, tenant: &Tenant) -> Self {
        Self {
            timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            operation,
            dataset: dataset.name().to_owned(),
            tenant: tenant.as_str().to_owned(),
        }
    }
}

/// Append `entry`, keeping at most `cap` newest entries.
///
/// Callers already hold the vault write lock. A log file that fails to parse
/// is treated as empty rather than blocking the append.
pub(crate) fn append(layout: &DataLayout, cap: usize, entry: AccessLogEntry) {
    let path = layout.access_log();
    let mut entries = match read_value(&path) {
        Ok(value) => serde_json::from_value::<Vec<AccessLogEntry>>(value).unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    entries.push(entry);
    if entries.len() > cap {
        let drop = entries.len() - cap;
        entries.drain(..drop);
    }
    let bytes = match serde_json::to_vec_pretty(&entries) {
        Ok(mut bytes) => {
            bytes.push(b'\n');
            bytes
        }
        Err(err) => {
            debug!(error = %err, "access log encode failed");
            return;
        }
    };
    if let Err(err) = write_atomic(&path, &bytes) {
        debug!(error = %err, path = %path.display(), "access log write failed");
    }
}

/// All entries currently on disk, oldest first. Missing log reads as empty.
pub fn read_entries(layout: &DataLayout) -> Result<Vec<AccessLogEntry>> {
    let path = layout.access_log();
    match read_value(&path) {
        Ok(value) => {
            let entries =
                serde_json::from_value(value).map_err(|err| LedgerError::corrupt(&path, err))?;
            Ok(entries)
        }
        Err(err) if err.is_unreadable() => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}
