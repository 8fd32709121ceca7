//! Proactive corruption detection and repair, outside the read/write hot
//! path.
//!
//! [`check_all`] probes every tenant × critical-dataset primary with a raw
//! read and classifies what it finds; [`repair_all`] routes each issue
//! through the vault's fallback cascade and reports which source restored
//! each dataset. [`IntegrityMonitor`] runs that cycle on a background thread
//! at a fixed interval.
//!
//! Both passes are idempotent: a second run over an unchanged store reports
//! no new issues and performs no redundant repairs.

mod check;
mod monitor;
mod repair;

pub use check::{IntegrityIssue, IssueKind, check_all, check_dataset};
pub use monitor::IntegrityMonitor;
pub use repair::{RepairAction, RepairOutcome, RepairReport, repair_all};
