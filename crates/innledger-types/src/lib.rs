//! Core type definitions for the innledger storage engine.
//!
//! The data model is deliberately small: a [`Tenant`] scopes every dataset
//! into an independent file, [`DatasetKind`] is the closed set of dataset
//! names the facade accepts, and a [`Collection`] is the parsed content of
//! one dataset file: either an ordered list of [`Record`]s or, for the rooms
//! dataset, a map from room number to [`RoomState`].

mod dataset;
mod record;

pub use dataset::{DatasetKind, DatasetShape, RecordSchema};
pub use record::{Collection, Record, RoomState, default_rooms};

use serde::{Deserialize, Deserializer, Serialize};

use innledger_error::{LedgerError, Result};

/// An opaque scope identifier partitioning every dataset into its own file.
///
/// Tenant ids become path components of every storage artifact, so they are
/// validated at construction: ASCII alphanumerics plus `-` and `_` only.
/// Deserialization goes through the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tenant(String);

impl Tenant {
    /// Maximum accepted id length, in bytes.
    pub const MAX_LEN: usize = 64;

    /// Validate and wrap a tenant id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(LedgerError::InvalidTenant {
                id,
                reason: "must not be empty",
            });
        }
        if id.len() > Self::MAX_LEN {
            return Err(LedgerError::InvalidTenant {
                id,
                reason: "longer than 64 bytes",
            });
        }
        if !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(LedgerError::InvalidTenant {
                id,
                reason: "only ASCII alphanumerics, '-' and '_' are allowed",
            });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tenant {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Tenant {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Tenant {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_accepts_plain_ids() {
        for id in ["hotel1", "hotel2", "branch-7", "north_annex", "X9"] {
            assert!(Tenant::new(id).is_ok(), "{id} should be accepted");
        }
    }

    #[test]
    fn test_tenant_rejects_path_hostile_ids() {
        for id in ["", "a/b", "..", "hotel 1", "hôtel", "a\\b", "a.b"] {
            assert!(Tenant::new(id).is_err(), "{id:?} should be rejected");
        }
    }

    #[test]
    fn test_tenant_rejects_oversized_ids() {
        let long = "x".repeat(Tenant::MAX_LEN + 1);
        assert!(Tenant::new(long).is_err());
        let max = "x".repeat(Tenant::MAX_LEN);
        assert!(Tenant::new(max).is_ok());
    }

    #[test]
    fn test_tenant_deserialize_validates() {
        let ok: std::result::Result<Tenant, _> = serde_json::from_str("\"hotel1\"");
        assert_eq!(ok.expect("valid tenant").as_str(), "hotel1");
        let bad: std::result::Result<Tenant, _> = serde_json::from_str("\"../etc\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_tenant_serializes_transparent() {
        let t = Tenant::new("hotel2").expect("valid tenant");
        assert_eq!(
            serde_json::to_string(&t).expect("serialize"),
            "\"hotel2\""
        );
    }
}
