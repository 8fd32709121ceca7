//! Record validation and normalization at the facade boundary.

use serde_json::Value;

use innledger_error::{LedgerError, Result};
use innledger_types::{DatasetKind, Record};

use crate::util::generate_id;

/// Validate and normalize one incoming record against `kind`'s schema.
///
/// A record leaves here ready to append: carrying a unique string id, its
/// schema numeric fields coerced to numbers, its schema date fields in the
/// canonical `YYYY-MM-DD HH:MM:SS` form, and every required field present
/// and non-null.
pub(crate) fn prepare_record(
    kind: DatasetKind,
    existing: &[Record],
    mut record: Record,
) -> Result<Record> {
    let schema = kind.schema();

    match record.get("id") {
        None | Some(Value::Null) => {
            record.set("id", generate_id());
        }
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(LedgerError::invalid_record("id must be a string"));
        }
    }
    if let Some(id) = record.id() {
        if existing.iter().any(|r| r.id() == Some(id)) {
            return Err(LedgerError::invalid_record(format!("duplicate id {id:?}")));
        }
    }

    record.coerce_numeric(schema.numeric);
    record.normalize_dates(schema.date);

    for &field in schema.required {
        if !record.has(field) {
            return Err(LedgerError::invalid_record(format!(
                "missing required field {field:?}"
            )));
        }
    }

    Ok(record)
}
