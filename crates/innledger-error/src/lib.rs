//! Error types for the innledger storage engine.
//!
//! Every fallible operation across the workspace returns [`Result`], built on
//! the single [`LedgerError`] enum. The variants split along the lines the
//! write/read protocols care about: read failures that the fallback cascade
//! absorbs (`Missing`, `Empty`, `Corrupt`, `ShapeMismatch`), write failures
//! that the retry loop may recover from (`Io`, `VerifyMismatch`), and terminal
//! conditions that surface to the caller (`SaveExhausted`,
//! `DeadlineExceeded`).

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for all innledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An underlying filesystem operation failed.
    #[error("i/o failure during {op} on {}: {source}", path.display())]
    Io {
        /// Short verb naming the operation, e.g. `"rename"` or `"copy"`.
        op: &'static str,
        /// File the operation was acting on.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dataset file does not exist.
    #[error("dataset file missing: {}", path.display())]
    Missing { path: PathBuf },

    /// A dataset file exists but holds no content (or only whitespace).
    #[error("dataset file empty: {}", path.display())]
    Empty { path: PathBuf },

    /// A dataset file exists but its content is not parseable.
    #[error("dataset file corrupt: {}: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },

    /// Parsed content does not match the dataset's declared shape.
    #[error("shape mismatch for dataset {dataset}: expected {expected}, found {found}")]
    ShapeMismatch {
        dataset: String,
        expected: &'static str,
        found: &'static str,
    },

    /// In-memory data could not be serialized.
    #[error("encode failure: {detail}")]
    Encode { detail: String },

    /// A just-written file read back different from what was written.
    #[error("post-write verification mismatch on {}", path.display())]
    VerifyMismatch { path: PathBuf },

    /// The write protocol ran past its configured deadline.
    #[error(
        "write deadline of {budget_ms} ms exceeded after {elapsed_ms} ms on {}",
        path.display()
    )]
    DeadlineExceeded {
        path: PathBuf,
        budget_ms: u64,
        elapsed_ms: u64,
    },

    /// Every write attempt failed and the rollback already ran.
    #[error("save failed after {attempts} attempts on {}: {detail}", path.display())]
    SaveExhausted {
        path: PathBuf,
        attempts: u32,
        detail: String,
    },

    /// A tenant identifier failed validation.
    #[error("invalid tenant id {id:?}: {reason}")]
    InvalidTenant { id: String, reason: &'static str },

    /// A dataset name outside the closed enumerated set.
    #[error("unknown dataset name: {name:?}")]
    UnknownDataset { name: String },

    /// A record was rejected at the facade boundary.
    #[error("record rejected: {reason}")]
    InvalidRecord { reason: String },

    /// An account operation was refused by the gatekeeper.
    #[error("account {username:?} refused: {reason}")]
    AccountRefused {
        username: String,
        reason: &'static str,
    },

    /// A named archive does not exist.
    #[error("archive not found: {name:?}")]
    ArchiveMissing { name: String },

    /// A configuration value failed validation.
    #[error("invalid configuration: {detail}")]
    Config { detail: String },
}

impl LedgerError {
    /// Build an [`LedgerError::Io`] without spelling the struct variant out.
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a [`LedgerError::Corrupt`] from any displayable parse failure.
    pub fn corrupt(path: impl AsRef<Path>, detail: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            path: path.as_ref().to_path_buf(),
            detail: detail.to_string(),
        }
    }

    /// Build a [`LedgerError::Config`].
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Build a [`LedgerError::Encode`] from any displayable serializer error.
    pub fn encode(detail: impl std::fmt::Display) -> Self {
        Self::Encode {
            detail: detail.to_string(),
        }
    }

    /// Build a [`LedgerError::InvalidRecord`].
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same operation could plausibly succeed.
    ///
    /// The write protocol retries transient failures up to its attempt bound;
    /// everything else either routes through the fallback cascade or is
    /// terminal.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::VerifyMismatch { .. })
    }

    /// Whether this error describes an unreadable source file.
    ///
    /// These are exactly the failures the read cascade treats as "no usable
    /// data here, try the next source".
    #[must_use]
    pub const fn is_unreadable(&self) -> bool {
        matches!(
            self,
            Self::Missing { .. }
                | Self::Empty { .. }
                | Self::Corrupt { .. }
                | Self::ShapeMismatch { .. }
        )
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, LedgerError>;
