//! The closed set of dataset names and their per-dataset schemas.

use serde::{Deserialize, Serialize};

use innledger_error::{LedgerError, Result};

/// Declared shape of a dataset's file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetShape {
    /// An ordered JSON array of record objects.
    RecordList,
    /// A JSON object mapping room number to room state.
    RoomMap,
}

/// Field-level rules applied at the facade boundary before a record is
/// accepted into a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    /// Fields that must be present and non-null after coercion.
    pub required: &'static [&'static str],
    /// Fields coerced to numbers when present (strings parse, junk becomes 0).
    pub numeric: &'static [&'static str],
    /// Fields whose bare `YYYY-MM-DD` values gain a ` 00:00:00` suffix.
    pub date: &'static [&'static str],
}

const DATED_AMOUNT: RecordSchema = RecordSchema {
    required: &["date", "amount"],
    numeric: &["amount"],
    date: &["date"],
};

const SCHEMA_ADVANCE_PAYMENTS: RecordSchema = RecordSchema {
    required: &["date", "amount"],
    numeric: &["amount", "advance_amount", "remaining_amount", "received_amount"],
    date: &["date"],
};

const SCHEMA_OUTSTANDING_DUES: RecordSchema = RecordSchema {
    required: &["date", "amount"],
    numeric: &["amount", "received_amount", "remaining_amount"],
    date: &["date"],
};

const SCHEMA_BAD_DEBTS: RecordSchema = RecordSchema {
    required: &["date", "amount"],
    numeric: &["amount", "original_amount"],
    date: &["date"],
};

const SCHEMA_DISCOUNTS: RecordSchema = RecordSchema {
    required: &["date", "amount"],
    numeric: &["amount", "original_amount", "discount_amount", "final_amount"],
    date: &["date"],
};

const SCHEMA_UPLOADED_BILLS: RecordSchema = RecordSchema {
    required: &["date"],
    numeric: &["amount", "total_amount"],
    date: &["date"],
};

const SCHEMA_COMPLEMENTARY_ROOMS: RecordSchema = RecordSchema {
    required: &["date", "room_value"],
    numeric: &["room_value", "price"],
    date: &["date"],
};

const SCHEMA_ROOM_SERVICES: RecordSchema = RecordSchema {
    required: &["date", "amount"],
    numeric: &["amount", "total_amount", "price"],
    date: &["date"],
};

/// Rooms hold no appendable records; the schema is empty and `add_record`
/// refuses the dataset outright.
const SCHEMA_ROOMS: RecordSchema = RecordSchema {
    required: &[],
    numeric: &[],
    date: &[],
};

/// The closed enumerated set of datasets the facade accepts.
///
/// Names outside this set are an error at parse time; there is no silent
/// passthrough for unknown dataset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Sales,
    Expenditures,
    Rooms,
    AdvancePayments,
    OutstandingDues,
    CashHandovers,
    AccountHandovers,
    BadDebts,
    Discounts,
    UploadedBills,
    ComplementaryRooms,
    RoomServices,
}

impl DatasetKind {
    /// Every dataset, in the order the original data files were laid out.
    pub const ALL: [Self; 12] = [
        Self::Sales,
        Self::Expenditures,
        Self::Rooms,
        Self::AdvancePayments,
        Self::OutstandingDues,
        Self::CashHandovers,
        Self::AccountHandovers,
        Self::BadDebts,
        Self::Discounts,
        Self::UploadedBills,
        Self::ComplementaryRooms,
        Self::RoomServices,
    ];

    /// Datasets the integrity checker watches.
    pub const CRITICAL: [Self; 5] = [
        Self::Sales,
        Self::Rooms,
        Self::Expenditures,
        Self::AdvancePayments,
        Self::OutstandingDues,
    ];

    /// Canonical snake_case name, as used in file stems.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Expenditures => "expenditures",
            Self::Rooms => "rooms",
            Self::AdvancePayments => "advance_payments",
            Self::OutstandingDues => "outstanding_dues",
            Self::CashHandovers => "cash_handovers",
            Self::AccountHandovers => "account_handovers",
            Self::BadDebts => "bad_debts",
            Self::Discounts => "discounts",
            Self::UploadedBills => "uploaded_bills",
            Self::ComplementaryRooms => "complementary_rooms",
            Self::RoomServices => "room_services",
        }
    }

    /// Declared shape of this dataset's file content.
    #[must_use]
    pub const fn shape(self) -> DatasetShape {
        match self {
            Self::Rooms => DatasetShape::RoomMap,
            _ => DatasetShape::RecordList,
        }
    }

    /// Validation rules applied by `add_record`.
    #[must_use]
    pub const fn schema(self) -> &'static RecordSchema {
        match self {
            Self::Sales | Self::Expenditures | Self::CashHandovers | Self::AccountHandovers => {
                &DATED_AMOUNT
            }
            Self::Rooms => &SCHEMA_ROOMS,
            Self::AdvancePayments => &SCHEMA_ADVANCE_PAYMENTS,
            Self::OutstandingDues => &SCHEMA_OUTSTANDING_DUES,
            Self::BadDebts => &SCHEMA_BAD_DEBTS,
            Self::Discounts => &SCHEMA_DISCOUNTS,
            Self::UploadedBills => &SCHEMA_UPLOADED_BILLS,
            Self::ComplementaryRooms => &SCHEMA_COMPLEMENTARY_ROOMS,
            Self::RoomServices => &SCHEMA_ROOM_SERVICES,
        }
    }

    /// Whether the integrity checker watches this dataset.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(
            self,
            Self::Sales
                | Self::Rooms
                | Self::Expenditures
                | Self::AdvancePayments
                | Self::OutstandingDues
        )
    }

    /// Parse a dataset name. Accepts the bare name and the legacy
    /// `<name>.json` form, case-insensitively.
    pub fn from_name(raw: &str) -> Result<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        let name = lowered.strip_suffix(".json").unwrap_or(&lowered);
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| LedgerError::UnknownDataset {
                name: raw.to_owned(),
            })
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DatasetKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_roundtrips() {
        for kind in DatasetKind::ALL {
            let parsed = DatasetKind::from_name(kind.name()).expect("known name");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_legacy_json_suffix_accepted() {
        assert_eq!(
            DatasetKind::from_name("sales.json").expect("legacy name"),
            DatasetKind::Sales
        );
        assert_eq!(
            DatasetKind::from_name("  Advance_Payments.JSON ").expect("mixed case"),
            DatasetKind::AdvancePayments
        );
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        for raw in ["users", "restaurant.json", "hotels", ""] {
            let err = DatasetKind::from_name(raw).expect_err("must reject");
            assert!(matches!(err, LedgerError::UnknownDataset { .. }));
        }
    }

    #[test]
    fn test_only_rooms_is_a_map() {
        for kind in DatasetKind::ALL {
            let expected = if kind == DatasetKind::Rooms {
                DatasetShape::RoomMap
            } else {
                DatasetShape::RecordList
            };
            assert_eq!(kind.shape(), expected, "shape of {kind}");
        }
    }

    #[test]
    fn test_critical_set_matches_flag() {
        for kind in DatasetKind::ALL {
            assert_eq!(
                DatasetKind::CRITICAL.contains(&kind),
                kind.is_critical(),
                "criticality of {kind}"
            );
        }
        assert_eq!(DatasetKind::CRITICAL.len(), 5);
    }

    #[test]
    fn test_serde_uses_snake_case_names() {
        for kind in DatasetKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.name()));
            let back: DatasetKind = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_record_schemas_normalize_dates() {
        for kind in DatasetKind::ALL {
            if kind == DatasetKind::Rooms {
                assert!(kind.schema().required.is_empty());
            } else {
                assert!(kind.schema().date.contains(&"date"), "schema of {kind}");
                assert!(kind.schema().required.contains(&"date"), "schema of {kind}");
            }
        }
    }
}
