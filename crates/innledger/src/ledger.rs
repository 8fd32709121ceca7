//! The tenant data facade: the single entry point page-level consumers use.

use std::sync::Arc;

use tracing::{info, warn};

use innledger_error::{LedgerError, Result};
use innledger_integrity::{check_all, repair_all};
use innledger_types::{Collection, DatasetKind, DatasetShape, Record, Tenant};
use innledger_vault::{Vault, VaultConfig};

use crate::records;

/// What [`Ledger::bootstrap`] did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    /// Primaries seeded because they were missing.
    pub seeded: usize,
    /// Broken primaries restored from a fallback source.
    pub repaired: usize,
    /// Broken primaries no source could restore.
    pub unrecoverable: usize,
}

/// Explicit handle over a [`Vault`], constructed once at process start and
/// passed by reference into consumers.
///
/// Loads never fail (they degrade to a synthesized default); saves can fail,
/// and the boolean-returning variants exist so page handlers can show an
/// error without crashing. Callers that want the failure itself use the
/// `try_` variants.
#[derive(Debug, Clone)]
pub struct Ledger {
    vault: Arc<Vault>,
}

impl Ledger {
    /// Open (creating if needed) the data directory described by `config`.
    pub fn open(config: VaultConfig) -> Result<Self> {
        Ok(Self {
            vault: Arc::new(Vault::open(config)?),
        })
    }

    /// Wrap an already-open vault; shares it with e.g. a running monitor.
    #[must_use]
    pub fn with_vault(vault: Arc<Vault>) -> Self {
        Self { vault }
    }

    #[must_use]
    pub fn vault(&self) -> &Arc<Vault> {
        &self.vault
    }

    #[must_use]
    pub fn tenants(&self) -> &[Tenant] {
        &self.vault.config().tenants
    }

    /// Load a dataset. Always returns a usable collection.
    #[must_use]
    pub fn load(&self, kind: DatasetKind, tenant: &Tenant) -> Collection {
        self.vault.load(tenant, kind)
    }

    /// Persist a dataset, surfacing the failure.
    pub fn try_save(&self, kind: DatasetKind, tenant: &Tenant, data: &Collection) -> Result<()> {
        self.vault.save(tenant, kind, data)
    }

    /// Persist a dataset; false means the write protocol gave up and the
    /// previous content was rolled back.
    pub fn save(&self, kind: DatasetKind, tenant: &Tenant, data: &Collection) -> bool {
        match self.try_save(kind, tenant, data) {
            Ok(()) => true,
            Err(err) => {
                warn!(dataset = kind.name(), tenant = %tenant, error = %err, "save failed");
                false
            }
        }
    }

    /// Validate `record`, append it, and save, surfacing the failure.
    pub fn try_add_record(&self, kind: DatasetKind, tenant: &Tenant, record: Record) -> Result<()> {
        if kind.shape() != DatasetShape::RecordList {
            return Err(LedgerError::invalid_record(
                "rooms hold keyed state, not appendable records",
            ));
        }
        let mut collection = self.load(kind, tenant);
        let Some(existing) = collection.as_records_mut() else {
            return Err(LedgerError::invalid_record("dataset does not hold records"));
        };
        let prepared = records::prepare_record(kind, existing, record)?;
        existing.push(prepared);
        self.try_save(kind, tenant, &collection)
    }

    /// Validate, append, and save; false means the record was rejected or
    /// the save failed, with the reason logged.
    pub fn add_record(&self, kind: DatasetKind, tenant: &Tenant, record: Record) -> bool {
        match self.try_add_record(kind, tenant, record) {
            Ok(()) => true,
            Err(err) => {
                warn!(dataset = kind.name(), tenant = %tenant, error = %err, "record refused");
                false
            }
        }
    }

    /// Startup sequence: seed missing primaries for every tenant × dataset,
    /// then check the critical datasets and repair whatever has a usable
    /// fallback source. Existing files are never touched by the seeding
    /// pass, so running this on a healthy store is a no-op.
    pub fn bootstrap(&self) -> Result<BootstrapSummary> {
        let mut summary = BootstrapSummary::default();
        for tenant in self.tenants() {
            for kind in DatasetKind::ALL {
                if self.vault.seed(tenant, kind)? {
                    summary.seeded += 1;
                }
            }
        }

        let issues = check_all(&self.vault);
        if !issues.is_empty() {
            info!(issues = issues.len(), "bootstrap found broken datasets; repairing");
            let report = repair_all(&self.vault);
            summary.repaired = report.restored();
            summary.unrecoverable = report.actions.len() - report.restored();
        }
        info!(
            seeded = summary.seeded,
            repaired = summary.repaired,
            unrecoverable = summary.unrecoverable,
            "bootstrap complete"
        );
        Ok(summary)
    }
}
