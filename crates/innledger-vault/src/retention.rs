//! Bounded retention for backup artifacts.
//!
//! Timestamped backups and emergency snapshots would otherwise grow without
//! limit; after creating a new artifact the vault prunes the oldest entries
//! beyond the configured cap. Artifact names sort lexicographically in
//! chronological order, so pruning is a sort-and-truncate.

use std::path::PathBuf;

use tracing::{debug, warn};

use innledger_store::DataLayout;
use innledger_types::{DatasetKind, Tenant};

pub(crate) fn prune_timestamped(
    layout: &DataLayout,
    tenant: &Tenant,
    kind: DatasetKind,
    cap: usize,
) {
    match layout.timestamped_backups(tenant, kind) {
        Ok(paths) => prune_to(paths, cap),
        Err(err) => warn!(error = %err, "backup scan failed; skipping prune"),
    }
}

pub(crate) fn prune_emergency(layout: &DataLayout, tenant: &Tenant, kind: DatasetKind, cap: usize) {
    match layout.emergency_snapshots(tenant, kind) {
        Ok(paths) => prune_to(paths, cap),
        Err(err) => warn!(error = %err, "snapshot scan failed; skipping prune"),
    }
}

/// Delete the oldest entries of `paths` (sorted oldest first) until at most
/// `cap` remain. Deletion failures are logged and skipped; a stuck file only
/// delays its own removal until the next prune.
fn prune_to(paths: Vec<PathBuf>, cap: usize) {
    if paths.len() <= cap {
        return;
    }
    let excess = paths.len() - cap;
    for path in &paths[..excess] {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "pruned backup artifact"),
            Err(err) => warn!(error = %err, path = %path.display(), "prune failed"),
        }
    }
}
