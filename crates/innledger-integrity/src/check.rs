//! Primary-file probing and issue classification.

use tracing::debug;

use innledger_error::LedgerError;
use innledger_types::{DatasetKind, Tenant};
use innledger_vault::Vault;

/// How a primary file failed its probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// The file does not exist.
    Missing,
    /// The file exists but holds only whitespace.
    Empty,
    /// The content did not parse, or did not match the dataset's shape.
    Corrupted,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Empty => f.write_str("empty"),
            Self::Corrupted => f.write_str("corrupted"),
        }
    }
}

/// One failed probe: which dataset, whose, and how it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    pub tenant: Tenant,
    pub dataset: DatasetKind,
    pub kind: IssueKind,
    /// The underlying error, rendered for reports.
    pub detail: String,
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}: {} ({})",
            self.tenant,
            self.dataset.name(),
            self.kind,
            self.detail
        )
    }
}

impl IntegrityIssue {
    fn classify(tenant: Tenant, dataset: DatasetKind, err: &LedgerError) -> Self {
        let kind = match err {
            LedgerError::Missing { .. } => IssueKind::Missing,
            LedgerError::Empty { .. } => IssueKind::Empty,
            _ => IssueKind::Corrupted,
        };
        Self {
            tenant,
            dataset,
            kind,
            detail: err.to_string(),
        }
    }
}

/// Probe one dataset's primary file. `None` means it read cleanly.
pub fn check_dataset(vault: &Vault, tenant: &Tenant, kind: DatasetKind) -> Option<IntegrityIssue> {
    match vault.read_primary(tenant, kind) {
        Ok(_) => None,
        Err(err) => {
            debug!(
                tenant = %tenant,
                dataset = kind.name(),
                error = %err,
                "integrity probe failed"
            );
            Some(IntegrityIssue::classify(tenant.clone(), kind, &err))
        }
    }
}

/// Probe every configured tenant × critical dataset.
#[must_use]
pub fn check_all(vault: &Vault) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    for tenant in &vault.config().tenants {
        for kind in DatasetKind::CRITICAL {
            if let Some(issue) = check_dataset(vault, tenant, kind) {
                issues.push(issue);
            }
        }
    }
    issues
}
