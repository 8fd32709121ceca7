//! Whole-store archive snapshots.
//!
//! Distinct from the per-dataset backup artifacts: an archive copies the
//! entire data directory (minus the archive directory itself) into
//! `backups/backup_<ts>/` for operator-driven restore.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use innledger_error::{LedgerError, Result};

use crate::vault::{Vault, disambiguate};

/// One archive snapshot under `data/backups/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Directory name, `backup_<YYYYMMDD_HHMMSS>` plus any collision suffix.
    pub name: String,
    pub path: PathBuf,
    /// Creation time parsed out of the name, `YYYY-MM-DD HH:MM:SS`.
    pub created: String,
}

impl Vault {
    /// Snapshot the whole data directory; returns the new archive's name.
    pub fn create_archive(&self) -> Result<String> {
        let _guard = self.write_lock.lock();
        self.create_archive_locked()
    }

    pub(crate) fn create_archive_locked(&self) -> Result<String> {
        let label = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let target = disambiguate(self.layout.archive_dir().join(format!("backup_{label}")));
        std::fs::create_dir_all(&target).map_err(|err| LedgerError::io("mkdir", &target, err))?;
        copy_tree(self.layout.root(), &target, Some(&self.layout.archive_dir()))?;
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(archive = %name, "archive created");
        Ok(name)
    }

    /// Archives on disk, newest first. Directories whose names do not carry
    /// a parseable timestamp are skipped.
    pub fn list_archives(&self) -> Result<Vec<ArchiveEntry>> {
        let dir = self.layout.archive_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(LedgerError::io("readdir", &dir, err)),
        };

        let mut archives = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| LedgerError::io("readdir", &dir, err))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(created) = parse_archive_stamp(&name) else {
                continue;
            };
            archives.push(ArchiveEntry {
                name,
                path: entry.path(),
                created,
            });
        }
        archives.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(archives)
    }

    /// Copy a named archive's contents back over the data directory.
    ///
    /// The current state is archived first, so a restore is itself
    /// reversible. Restored files overlay the live tree; files the archive
    /// never contained are left alone.
    pub fn restore_archive(&self, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let source = self.layout.archive_dir().join(name);
        if !is_archive_name(name) || !source.is_dir() {
            return Err(LedgerError::ArchiveMissing {
                name: name.to_owned(),
            });
        }
        let safety = self.create_archive_locked()?;
        info!(archive = name, safety = %safety, "restoring archive");
        copy_tree(&source, self.layout.root(), None)
    }
}

/// `backup_` prefix and no path separators; keeps joins inside the archive
/// directory.
fn is_archive_name(name: &str) -> bool {
    name.starts_with("backup_") && !name.contains(['/', '\\'])
}

fn parse_archive_stamp(name: &str) -> Option<String> {
    let stamp = name.strip_prefix("backup_")?.get(..15)?;
    let parsed = NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S").ok()?;
    Some(parsed.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Recursively copy `src` into `dst`, skipping the `exclude` directory.
fn copy_tree(src: &Path, dst: &Path, exclude: Option<&Path>) -> Result<()> {
    std::fs::create_dir_all(dst).map_err(|err| LedgerError::io("mkdir", dst, err))?;
    let entries = std::fs::read_dir(src).map_err(|err| LedgerError::io("readdir", src, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| LedgerError::io("readdir", src, err))?;
        let from = entry.path();
        if exclude.is_some_and(|ex| from == ex) {
            continue;
        }
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_tree(&from, &to, exclude)?;
        } else {
            std::fs::copy(&from, &to).map_err(|err| LedgerError::io("copy", &from, err))?;
        }
    }
    Ok(())
}
