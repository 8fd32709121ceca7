//! Artifact path derivation for one data directory.

use std::path::{Path, PathBuf};

use innledger_error::{LedgerError, Result};
use innledger_types::{DatasetKind, Tenant};

/// All storage artifacts of one data directory, derived from its root.
///
/// Every dataset+tenant pair shares a single file stem
/// (`<tenant>_<dataset>.json`) across artifact tiers, so the layout is the
/// one place that knows how stems map to concrete paths:
///
/// ```text
/// data/hotel1_sales.json                                   primary
/// data/auto_backups/hotel1_sales.json.backup               fixed backup
/// data/auto_backups/hotel1_sales.json_<ts>.backup          timestamped backup
/// data/redundant/hotel1_sales.json                         mirror
/// data/redundant/hotel1_sales.json.copy2                   mirror twin
/// data/emergency_backups/emergency_hotel1_sales.json_<ts>.json
/// data/access_log.json                                     audit trail
/// data/backups/backup_<ts>/                                whole-store archive
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The tenant-prefixed file name shared by all artifact tiers.
    #[must_use]
    pub fn stem(tenant: &Tenant, kind: DatasetKind) -> String {
        format!("{tenant}_{}.json", kind.name())
    }

    /// The authoritative dataset file.
    #[must_use]
    pub fn primary(&self, tenant: &Tenant, kind: DatasetKind) -> PathBuf {
        self.root.join(Self::stem(tenant, kind))
    }

    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("auto_backups")
    }

    /// The fixed-name backup, overwritten on every save; rollback source for
    /// write failures.
    #[must_use]
    pub fn fixed_backup(&self, tenant: &Tenant, kind: DatasetKind) -> PathBuf {
        self.backup_dir()
            .join(format!("{}.backup", Self::stem(tenant, kind)))
    }

    /// A timestamped backup under `label` (caller formats the timestamp).
    #[must_use]
    pub fn timestamped_backup(&self, tenant: &Tenant, kind: DatasetKind, label: &str) -> PathBuf {
        self.backup_dir()
            .join(format!("{}_{label}.backup", Self::stem(tenant, kind)))
    }

    #[must_use]
    pub fn redundant_dir(&self) -> PathBuf {
        self.root.join("redundant")
    }

    /// First post-write mirror copy.
    #[must_use]
    pub fn mirror(&self, tenant: &Tenant, kind: DatasetKind) -> PathBuf {
        self.redundant_dir().join(Self::stem(tenant, kind))
    }

    /// Second post-write mirror copy.
    #[must_use]
    pub fn mirror_twin(&self, tenant: &Tenant, kind: DatasetKind) -> PathBuf {
        self.redundant_dir()
            .join(format!("{}.copy2", Self::stem(tenant, kind)))
    }

    #[must_use]
    pub fn emergency_dir(&self) -> PathBuf {
        self.root.join("emergency_backups")
    }

    /// A pre-write snapshot of incoming data under `label`.
    #[must_use]
    pub fn emergency_snapshot(&self, tenant: &Tenant, kind: DatasetKind, label: &str) -> PathBuf {
        self.emergency_dir().join(format!(
            "emergency_{}_{label}.json",
            Self::stem(tenant, kind)
        ))
    }

    #[must_use]
    pub fn access_log(&self) -> PathBuf {
        self.root.join("access_log.json")
    }

    /// Directory holding whole-store archive snapshots.
    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// Create the directory tree every write path assumes.
    pub fn ensure_tree(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.backup_dir(),
            self.redundant_dir(),
            self.emergency_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|err| LedgerError::io("mkdir", &dir, err))?;
        }
        Ok(())
    }

    /// Timestamped backups for one dataset+tenant, sorted oldest first.
    ///
    /// Lexicographic file-name order is chronological by construction (the
    /// label is `YYYYMMDD_HHMMSS` with an optional zero-padded collision
    /// suffix), so callers reverse the list to scan newest first.
    pub fn timestamped_backups(&self, tenant: &Tenant, kind: DatasetKind) -> Result<Vec<PathBuf>> {
        let prefix = format!("{}_", Self::stem(tenant, kind));
        scan_sorted(&self.backup_dir(), &prefix, ".backup")
    }

    /// Emergency snapshots for one dataset+tenant, sorted oldest first.
    pub fn emergency_snapshots(&self, tenant: &Tenant, kind: DatasetKind) -> Result<Vec<PathBuf>> {
        let prefix = format!("emergency_{}_", Self::stem(tenant, kind));
        scan_sorted(&self.emergency_dir(), &prefix, ".json")
    }
}

/// List files in `dir` whose names match `prefix`…`suffix`, sorted by name.
///
/// A missing directory is an empty listing, not an error.
fn scan_sorted(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(LedgerError::io("readdir", dir, err)),
    };

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| LedgerError::io("readdir", dir, err))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(prefix) && name.ends_with(suffix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}
