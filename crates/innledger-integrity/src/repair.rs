//! Cascade-driven repair of the issues the checker finds.

use tracing::{info, warn};

use innledger_types::{DatasetKind, Tenant};
use innledger_vault::{RecoverySource, Vault};

use crate::check::check_all;

/// What happened to one broken dataset during a repair pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// A fallback source parsed and was copied back over the primary.
    Restored { source: RecoverySource },
    /// No fallback source was usable; the primary is left as found.
    Unrecoverable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairAction {
    pub tenant: Tenant,
    pub dataset: DatasetKind,
    pub outcome: RepairOutcome,
}

impl std::fmt::Display for RepairAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            RepairOutcome::Restored { source } => write!(
                f,
                "{}/{}: restored from {source}",
                self.tenant,
                self.dataset.name()
            ),
            RepairOutcome::Unrecoverable => write!(
                f,
                "{}/{}: unrecoverable",
                self.tenant,
                self.dataset.name()
            ),
        }
    }
}

/// Everything one [`repair_all`] pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub actions: Vec<RepairAction>,
}

impl RepairReport {
    /// True when every found issue was restored (vacuously true for a clean
    /// store).
    #[must_use]
    pub fn success(&self) -> bool {
        self.actions
            .iter()
            .all(|a| matches!(a.outcome, RepairOutcome::Restored { .. }))
    }

    /// Number of datasets actually restored this pass.
    #[must_use]
    pub fn restored(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a.outcome, RepairOutcome::Restored { .. }))
            .count()
    }

    /// True when the pass found nothing to do.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Check every critical dataset and run the fallback cascade on each issue.
///
/// Restores go through [`Vault::recover`], which copies the recovered
/// content back over the primary; a repaired dataset therefore probes clean
/// on the next pass, which is what makes back-to-back passes idempotent.
/// Nothing is synthesized here: a dataset with no usable source is reported
/// unrecoverable and left for [`Vault::load`] to heal on first use.
#[must_use]
pub fn repair_all(vault: &Vault) -> RepairReport {
    let mut actions = Vec::new();
    for issue in check_all(vault) {
        let outcome = match vault.recover(&issue.tenant, issue.dataset) {
            Some((_, source)) => {
                info!(
                    tenant = %issue.tenant,
                    dataset = issue.dataset.name(),
                    source = %source,
                    "dataset repaired"
                );
                RepairOutcome::Restored { source }
            }
            None => {
                warn!(
                    tenant = %issue.tenant,
                    dataset = issue.dataset.name(),
                    "no recovery source for dataset"
                );
                RepairOutcome::Unrecoverable
            }
        };
        actions.push(RepairAction {
            tenant: issue.tenant,
            dataset: issue.dataset,
            outcome,
        });
    }
    RepairReport { actions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use innledger_types::{Collection, Record};
    use innledger_vault::VaultConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_vault() -> (TempDir, Vault) {
        let dir = TempDir::new().expect("tempdir");
        let config = VaultConfig::rooted_at(dir.path().join("data"));
        let vault = Vault::open(config).expect("open");
        (dir, vault)
    }

    fn tenant(id: &str) -> Tenant {
        Tenant::new(id).expect("tenant")
    }

    fn seed_all(vault: &Vault) {
        for t in &vault.config().tenants {
            for kind in DatasetKind::CRITICAL {
                let data = Collection::synthesized_default(kind, t);
                vault.save(t, kind, &data).expect("seed");
            }
        }
    }

    fn sales(id: &str, amount: i64) -> Collection {
        Collection::Records(vec![Record::from_map(
            json!({"id": id, "amount": amount, "status": "Pending"})
                .as_object()
                .expect("object")
                .clone(),
        )])
    }

    #[test]
    fn test_clean_store_yields_empty_report() {
        let (_dir, vault) = open_vault();
        seed_all(&vault);
        let report = repair_all(&vault);
        assert!(report.is_clean());
        assert!(report.success());
        assert_eq!(report.restored(), 0);
    }

    #[test]
    fn test_corrupt_primary_restored_from_mirror() {
        let (_dir, vault) = open_vault();
        seed_all(&vault);
        let t = tenant("hotel1");
        let data = sales("abc123", 500);
        vault.save(&t, DatasetKind::Sales, &data).expect("save");

        let primary = vault.layout().primary(&t, DatasetKind::Sales);
        std::fs::write(&primary, b"{ broken").expect("corrupt");

        let report = repair_all(&vault);
        assert!(report.success());
        assert_eq!(report.restored(), 1);
        assert_eq!(
            report.actions[0].outcome,
            RepairOutcome::Restored {
                source: RecoverySource::Mirror
            }
        );
        assert_eq!(vault.read_primary(&t, DatasetKind::Sales).expect("probe"), data);
    }

    #[test]
    fn test_second_pass_restores_nothing() {
        let (_dir, vault) = open_vault();
        seed_all(&vault);
        let t = tenant("hotel2");
        std::fs::write(
            vault.layout().primary(&t, DatasetKind::Expenditures),
            b"   ",
        )
        .expect("empty");

        let first = repair_all(&vault);
        assert_eq!(first.restored(), 1);

        let second = repair_all(&vault);
        assert!(second.is_clean());
    }

    #[test]
    fn test_unrecoverable_dataset_reported_not_synthesized() {
        let (_dir, vault) = open_vault();
        seed_all(&vault);
        let t = tenant("hotel1");

        // Erase the primary and every fallback source.
        let layout = vault.layout().clone();
        std::fs::remove_file(layout.primary(&t, DatasetKind::Sales)).expect("rm primary");
        std::fs::remove_file(layout.mirror(&t, DatasetKind::Sales)).expect("rm mirror");
        std::fs::remove_file(layout.mirror_twin(&t, DatasetKind::Sales)).expect("rm twin");
        let _ = std::fs::remove_file(layout.fixed_backup(&t, DatasetKind::Sales));
        for backup in layout
            .timestamped_backups(&t, DatasetKind::Sales)
            .expect("scan")
        {
            std::fs::remove_file(backup).expect("rm backup");
        }

        let report = repair_all(&vault);
        assert!(!report.success());
        assert_eq!(report.restored(), 0);
        assert_eq!(report.actions.len(), 1);
        assert_eq!(report.actions[0].outcome, RepairOutcome::Unrecoverable);
        // repair_all does not invent data; the primary stays missing.
        assert!(!layout.primary(&t, DatasetKind::Sales).exists());
    }

    #[test]
    fn test_repair_action_display() {
        let action = RepairAction {
            tenant: tenant("hotel1"),
            dataset: DatasetKind::Sales,
            outcome: RepairOutcome::Restored {
                source: RecoverySource::FixedBackup,
            },
        };
        assert_eq!(action.to_string(), "hotel1/sales: restored from fixed backup");
    }
}
