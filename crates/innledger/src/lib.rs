//! Tenant-facing bookkeeping facade over the redundancy layer.
//!
//! [`Ledger`] is the one type application code talks to. It loads datasets
//! that are always readable, validates records at the boundary before they
//! reach disk, answers the standard reports, records back-dated entries, and
//! seeds fresh installations. Every persisted byte flows through [`Vault`],
//! so the backup, verification, and recovery guarantees hold for every
//! facade call.
//!
//! The crate re-exports the foundation types so application code needs a
//! single dependency:
//!
//! ```no_run
//! use innledger::{DatasetKind, Ledger, Record, Tenant, VaultConfig};
//!
//! # fn main() -> innledger::Result<()> {
//! let ledger = Ledger::open(VaultConfig::default())?;
//! ledger.bootstrap()?;
//! let tenant = Tenant::new("hotel1")?;
//! let sales = ledger.load(DatasetKind::Sales, &tenant);
//! println!("{} sales on file", sales.len());
//! # Ok(())
//! # }
//! ```

mod gatekeeper;
mod history;
mod ledger;
mod records;
mod reports;
mod util;

pub use gatekeeper::{AccessDecision, Gatekeeper, Role, TenantScope};
pub use ledger::{BootstrapSummary, Ledger};
pub use util::{current_date, current_timestamp, generate_id};

pub use innledger_error::{LedgerError, Result};
pub use innledger_integrity::{
    IntegrityIssue, IntegrityMonitor, IssueKind, RepairAction, RepairOutcome, RepairReport,
    check_all, repair_all,
};
pub use innledger_types::{Collection, DatasetKind, Record, RoomState, Tenant};
pub use innledger_vault::{AccessLogEntry, RecoverySource, Vault, VaultConfig, read_entries};
