//! Record store: the leaf persistence layer of innledger.
//!
//! This crate owns the three concerns every higher layer builds on:
//!
//! - [`DataLayout`]: derivation of every artifact path (primary files,
//!   backups, mirrors, emergency snapshots, the access log) from one data
//!   directory root.
//! - [`codec`]: reading a dataset file into a [`Collection`] with the failure
//!   classification the fallback cascade depends on (missing vs. empty vs.
//!   corrupt), and the deterministic pretty-JSON encoding every writer uses.
//! - [`atomic`]: write-to-temp-then-rename file replacement so no reader ever
//!   observes a half-written dataset file.
//!
//! Nothing here retries, falls back, or recovers; that is the vault's job.
//! A read either yields usable data or a classified error, and a write either
//! fully replaces the target or leaves it untouched.
//!
//! [`Collection`]: innledger_types::Collection

mod atomic;
mod codec;
mod layout;

pub use atomic::{copy_atomic, remove_if_exists, write_atomic};
pub use codec::{encode_collection, encode_value, read_collection, read_value};
pub use layout::DataLayout;
