//! Redundancy layer: resilient reads and writes over the record store.
//!
//! The backing medium is plain files with no transactional guarantees, so
//! [`Vault`] builds its own from defense in depth:
//!
//! - every write backs up the previous content (fixed-name plus a rolling
//!   window of timestamped copies), snapshots the incoming data into an
//!   emergency trail, replaces the target atomically, verifies the bytes on
//!   disk, and mirrors the result twice;
//! - every read that fails on the primary walks a fallback cascade (mirror,
//!   twin, fixed backup, timestamped backups newest first) and repairs the
//!   primary from the first source that parses;
//! - if every source is gone, the dataset is synthesized (default room
//!   layout for rooms, empty otherwise) so [`Vault::load`] never fails.
//!
//! Writes, cascade restores, and archive operations serialize on one
//! process-wide lock; a successful primary read takes no lock.

mod access_log;
mod archive;
mod config;
mod retention;
mod retry;
mod vault;

pub use access_log::{AccessLogEntry, Operation, read_entries};
pub use archive::ArchiveEntry;
pub use config::VaultConfig;
pub use retry::{Backoff, NoBackoff, RetryPolicy, SleepBackoff};
pub use vault::{RecoverySource, Vault};
