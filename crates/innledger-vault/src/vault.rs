//! The vault: redundant writes and cascading reads for one data directory.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use innledger_error::{LedgerError, Result};
use innledger_store::{DataLayout, copy_atomic, encode_collection, read_collection, write_atomic};
use innledger_types::{Collection, DatasetKind, DatasetShape, Tenant};

use crate::access_log::{self, AccessLogEntry, Operation};
use crate::config::VaultConfig;
use crate::retention;
use crate::retry::{Backoff, SleepBackoff};

/// Which fallback source satisfied a recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySource {
    Mirror,
    MirrorTwin,
    FixedBackup,
    TimestampedBackup { name: String },
}

impl std::fmt::Display for RecoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mirror => f.write_str("redundant mirror"),
            Self::MirrorTwin => f.write_str("redundant mirror twin"),
            Self::FixedBackup => f.write_str("fixed backup"),
            Self::TimestampedBackup { name } => write!(f, "timestamped backup {name}"),
        }
    }
}

/// Redundancy layer over one data directory.
///
/// All mutating paths (saves, cascade restores, repairs, archive operations)
/// serialize on one process-wide mutex; a read that succeeds on the primary
/// file takes no lock. Within one dataset+tenant, writes are therefore
/// strictly ordered; across tenants the data is disjoint, so no further
/// ordering is needed.
pub struct Vault {
    pub(crate) layout: DataLayout,
    pub(crate) config: VaultConfig,
    backoff: Box<dyn Backoff>,
    pub(crate) write_lock: Mutex<()>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("root", &self.layout.root())
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Open (and create, if needed) the data directory described by `config`.
    pub fn open(config: VaultConfig) -> Result<Self> {
        Self::open_with_backoff(config, Box::new(SleepBackoff))
    }

    /// [`Vault::open`] with an injected pause strategy; tests pass
    /// [`crate::NoBackoff`] to drive retry loops without real sleeps.
    pub fn open_with_backoff(config: VaultConfig, backoff: Box<dyn Backoff>) -> Result<Self> {
        config.validate()?;
        let layout = DataLayout::new(&config.data_dir);
        layout.ensure_tree()?;
        Ok(Self {
            layout,
            config,
            backoff,
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    // ── Write protocol ───────────────────────────────────────────────────

    /// Persist `data` as the new content of `tenant`'s `kind` dataset.
    ///
    /// The protocol, in order: back up the existing primary (fixed name plus
    /// a timestamped copy), snapshot the incoming bytes into the emergency
    /// trail, replace the primary atomically, read it back and compare, and
    /// mirror the verified result twice. Write-and-verify is retried up to
    /// the configured attempt count; on exhaustion (or on blowing the write
    /// deadline) the primary is rolled back from the fixed backup and the
    /// failure is returned.
    pub fn save(&self, tenant: &Tenant, kind: DatasetKind, data: &Collection) -> Result<()> {
        if data.shape() != kind.shape() {
            return Err(LedgerError::ShapeMismatch {
                dataset: kind.name().to_owned(),
                expected: shape_name(kind.shape()),
                found: shape_name(data.shape()),
            });
        }
        let bytes = encode_collection(data)?;
        let _guard = self.write_lock.lock();
        self.save_locked(tenant, kind, &bytes)
    }

    /// The write protocol proper. Caller holds the write lock.
    pub(crate) fn save_locked(
        &self,
        tenant: &Tenant,
        kind: DatasetKind,
        bytes: &[u8],
    ) -> Result<()> {
        let deadline = Deadline::start(self.config.write_deadline());
        let primary = self.layout.primary(tenant, kind);
        self.layout.ensure_tree()?;

        // Step 1: preserve whatever is there now. The fixed backup doubles
        // as the rollback source if the rewrite fails.
        if primary.exists() {
            copy_atomic(&primary, &self.layout.fixed_backup(tenant, kind))?;
            copy_atomic(&primary, &self.timestamped_backup_path(tenant, kind))?;
            retention::prune_timestamped(
                &self.layout,
                tenant,
                kind,
                self.config.timestamped_backups,
            );
        }
        deadline.check(&primary)?;

        // Step 2: the incoming data survives somewhere before the primary
        // is touched, whatever happens next.
        write_atomic(&self.emergency_snapshot_path(tenant, kind), bytes)?;
        retention::prune_emergency(&self.layout, tenant, kind, self.config.emergency_snapshots);
        deadline.check(&primary)?;

        // Steps 3 and 4: atomic replace, then read back and compare.
        let mut failure: Option<LedgerError> = None;
        for attempt in 1..=self.config.retry.max_attempts {
            match write_and_verify(&primary, bytes) {
                Ok(()) => {
                    failure = None;
                    break;
                }
                Err(err) => {
                    warn!(
                        attempt,
                        error = %err,
                        path = %primary.display(),
                        "write attempt failed"
                    );
                    failure = Some(err);
                }
            }
            if attempt < self.config.retry.max_attempts {
                self.backoff.pause(attempt, self.config.retry.base_pause());
            }
            if let Err(err) = deadline.check(&primary) {
                failure = Some(err);
                break;
            }
        }
        if let Some(err) = failure {
            self.roll_back(&primary, tenant, kind);
            return Err(match err {
                deadline_err @ LedgerError::DeadlineExceeded { .. } => deadline_err,
                other => LedgerError::SaveExhausted {
                    path: primary,
                    attempts: self.config.retry.max_attempts,
                    detail: other.to_string(),
                },
            });
        }

        // Step 5: mirror copies are read fallbacks only, so a failure here
        // does not fail the save.
        for mirror in [
            self.layout.mirror(tenant, kind),
            self.layout.mirror_twin(tenant, kind),
        ] {
            if let Err(err) = write_atomic(&mirror, bytes) {
                warn!(error = %err, path = %mirror.display(), "mirror copy failed");
            }
        }

        access_log::append(
            &self.layout,
            self.config.access_log_cap,
            AccessLogEntry::now(Operation::Save, kind, tenant),
        );
        debug!(tenant = %tenant, dataset = kind.name(), bytes = bytes.len(), "dataset saved");
        Ok(())
    }

    /// Restore the primary from the fixed backup after a failed rewrite.
    fn roll_back(&self, primary: &Path, tenant: &Tenant, kind: DatasetKind) {
        let fixed = self.layout.fixed_backup(tenant, kind);
        if !fixed.exists() {
            warn!(path = %primary.display(), "no fixed backup to roll back from");
            return;
        }
        match copy_atomic(&fixed, primary) {
            Ok(()) => info!(path = %primary.display(), "primary rolled back from fixed backup"),
            Err(err) => {
                error!(error = %err, path = %primary.display(), "rollback from fixed backup failed");
            }
        }
    }

    // ── Read cascade ─────────────────────────────────────────────────────

    /// Load `tenant`'s `kind` dataset. Never fails.
    ///
    /// The primary is tried without the lock first. If it is unreadable the
    /// lock is taken, the primary is re-tried (another thread may have
    /// repaired it meanwhile), then the fallback cascade runs. If every
    /// source fails, a default is synthesized (the tenant's room layout for
    /// rooms, an empty collection otherwise) and persisted as the new
    /// primary.
    pub fn load(&self, tenant: &Tenant, kind: DatasetKind) -> Collection {
        let primary = self.layout.primary(tenant, kind);
        match read_collection(&primary, kind) {
            Ok(data) => return data,
            Err(err) => {
                debug!(
                    tenant = %tenant,
                    dataset = kind.name(),
                    error = %err,
                    "primary read failed; entering fallback cascade"
                );
            }
        }

        let _guard = self.write_lock.lock();
        if let Ok(data) = read_collection(&primary, kind) {
            return data;
        }
        if let Some((data, source)) = self.recover_locked(tenant, kind) {
            info!(
                tenant = %tenant,
                dataset = kind.name(),
                source = %source,
                "dataset recovered"
            );
            return data;
        }

        warn!(
            tenant = %tenant,
            dataset = kind.name(),
            "all recovery sources failed; synthesizing default"
        );
        let data = Collection::synthesized_default(kind, tenant);
        match encode_collection(&data) {
            Ok(bytes) => {
                if let Err(err) = self.save_locked(tenant, kind, &bytes) {
                    warn!(error = %err, "failed to persist synthesized dataset");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode synthesized dataset"),
        }
        data
    }

    /// Raw primary read with no fallback; the integrity checker's probe.
    pub fn read_primary(&self, tenant: &Tenant, kind: DatasetKind) -> Result<Collection> {
        read_collection(&self.layout.primary(tenant, kind), kind)
    }

    /// Seed a missing primary with the dataset's default content.
    ///
    /// Existing files are left untouched, whatever their state; returns
    /// whether a file was written. Seeding writes the primary only, so a
    /// fresh store starts clean without a backlog of backup artifacts.
    pub fn seed(&self, tenant: &Tenant, kind: DatasetKind) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let primary = self.layout.primary(tenant, kind);
        if primary.exists() {
            return Ok(false);
        }
        self.layout.ensure_tree()?;
        let data = Collection::synthesized_default(kind, tenant);
        write_atomic(&primary, &encode_collection(&data)?)?;
        debug!(tenant = %tenant, dataset = kind.name(), "primary seeded");
        Ok(true)
    }

    /// Run the fallback cascade for one dataset and restore the primary from
    /// the first source that parses. `None` means no source was usable;
    /// unlike [`Vault::load`], nothing is synthesized.
    pub fn recover(
        &self,
        tenant: &Tenant,
        kind: DatasetKind,
    ) -> Option<(Collection, RecoverySource)> {
        let _guard = self.write_lock.lock();
        self.recover_locked(tenant, kind)
    }

    fn recover_locked(
        &self,
        tenant: &Tenant,
        kind: DatasetKind,
    ) -> Option<(Collection, RecoverySource)> {
        let primary = self.layout.primary(tenant, kind);
        let mut candidates = vec![
            (self.layout.mirror(tenant, kind), RecoverySource::Mirror),
            (self.layout.mirror_twin(tenant, kind), RecoverySource::MirrorTwin),
            (self.layout.fixed_backup(tenant, kind), RecoverySource::FixedBackup),
        ];
        match self.layout.timestamped_backups(tenant, kind) {
            Ok(backups) => {
                for path in backups.into_iter().rev() {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    candidates.push((path, RecoverySource::TimestampedBackup { name }));
                }
            }
            Err(err) => warn!(error = %err, "backup scan failed during recovery"),
        }

        for (path, source) in candidates {
            match read_collection(&path, kind) {
                Ok(data) => {
                    // Best-effort restore: if the copy back fails, the data
                    // is still returned and the next load tries again.
                    match copy_atomic(&path, &primary) {
                        Ok(()) => {
                            access_log::append(
                                &self.layout,
                                self.config.access_log_cap,
                                AccessLogEntry::now(Operation::Repair, kind, tenant),
                            );
                        }
                        Err(err) => {
                            warn!(
                                error = %err,
                                path = %primary.display(),
                                "primary restore failed; returning recovered data anyway"
                            );
                        }
                    }
                    return Some((data, source));
                }
                Err(err) => {
                    debug!(source = %source, error = %err, "recovery source unusable");
                }
            }
        }
        None
    }

    // ── Artifact naming ──────────────────────────────────────────────────

    fn timestamped_backup_path(&self, tenant: &Tenant, kind: DatasetKind) -> PathBuf {
        let label = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        disambiguate(self.layout.timestamped_backup(tenant, kind, &label))
    }

    fn emergency_snapshot_path(&self, tenant: &Tenant, kind: DatasetKind) -> PathBuf {
        let label = chrono::Local::now().format("%Y%m%d_%H%M%S_%6f").to_string();
        disambiguate(self.layout.emergency_snapshot(tenant, kind, &label))
    }
}

/// Append a zero-padded counter before the extension until the name is free.
///
/// Keeps lexicographic order chronological: `'.'` sorts before `'_'`, so the
/// plain name stays ahead of its suffixed collisions, which in turn stay
/// ahead of the next second's plain name.
pub(crate) fn disambiguate(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    for n in 1..1000u32 {
        let name = if ext.is_empty() {
            format!("{stem}_{n:03}")
        } else {
            format!("{stem}_{n:03}.{ext}")
        };
        let candidate = path.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    path
}

/// Atomic replace plus read-back verification.
///
/// The canonical encoding is deterministic, so a byte compare against the
/// just-written file is an exact structure compare.
fn write_and_verify(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic(path, bytes)?;
    let on_disk = std::fs::read(path).map_err(|err| LedgerError::io("read", path, err))?;
    if on_disk != bytes {
        return Err(LedgerError::VerifyMismatch {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn shape_name(shape: DatasetShape) -> &'static str {
    match shape {
        DatasetShape::RecordList => "array of records",
        DatasetShape::RoomMap => "map of room states",
    }
}

/// Wall-clock budget for one pass through the write protocol, checked
/// between protocol steps.
struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    fn check(&self, path: &Path) -> Result<()> {
        let elapsed = self.started.elapsed();
        if elapsed <= self.budget {
            return Ok(());
        }
        Err(LedgerError::DeadlineExceeded {
            path: path.to_path_buf(),
            budget_ms: self.budget.as_millis() as u64,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}
