//! Dataset file (de)serialization with failure classification.
//!
//! The read side never treats an unreadable file as an empty dataset: a
//! missing file, a whitespace-only file, and a parse failure each come back
//! as their own error variant so the fallback cascade and the integrity
//! checker can tell them apart. The write side produces pretty-printed JSON
//! with stable field order, so re-encoding unchanged data is byte-identical.

use std::path::Path;

use serde_json::Value;

use innledger_error::{LedgerError, Result};
use innledger_types::{Collection, DatasetKind};

/// Read and parse a file as JSON.
///
/// # Errors
///
/// - [`LedgerError::Missing`] if the file does not exist.
/// - [`LedgerError::Empty`] if it holds nothing but whitespace.
/// - [`LedgerError::Corrupt`] if the content is not valid UTF-8 JSON.
/// - [`LedgerError::Io`] for any other read failure (permissions, hardware).
pub fn read_value(path: &Path) -> Result<Value> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(LedgerError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(LedgerError::io("read", path, err)),
    };

    let text = std::str::from_utf8(&bytes).map_err(|err| LedgerError::corrupt(path, err))?;
    if text.trim().is_empty() {
        return Err(LedgerError::Empty {
            path: path.to_path_buf(),
        });
    }

    serde_json::from_str(text).map_err(|err| LedgerError::corrupt(path, err))
}

/// Read a file and interpret it as `kind`'s declared shape.
///
/// Shape violations surface as [`LedgerError::ShapeMismatch`], which the
/// cascade treats the same as corruption.
pub fn read_collection(path: &Path, kind: DatasetKind) -> Result<Collection> {
    let value = read_value(path)?;
    Collection::from_value(kind, value)
}

/// Deterministic canonical encoding: two-space pretty JSON, trailing newline.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(LedgerError::encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// [`encode_value`] for a parsed collection.
pub fn encode_collection(collection: &Collection) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(collection).map_err(LedgerError::encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use innledger_types::{Record, Tenant};
    use serde_json::json;

    fn write(path: &Path, content: &[u8]) {
        std::fs::write(path, content).expect("write test file");
    }

    #[test]
    fn test_missing_file_classified() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_value(&dir.path().join("absent.json")).expect_err("must fail");
        assert!(matches!(err, LedgerError::Missing { .. }));
    }

    #[test]
    fn test_empty_and_whitespace_classified() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blank.json");

        write(&path, b"");
        assert!(matches!(
            read_value(&path).expect_err("empty"),
            LedgerError::Empty { .. }
        ));

        write(&path, b"  \n\t  ");
        assert!(matches!(
            read_value(&path).expect_err("whitespace"),
            LedgerError::Empty { .. }
        ));
    }

    #[test]
    fn test_malformed_content_classified() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");

        write(&path, b"[{\"id\": \"abc\"");
        assert!(matches!(
            read_value(&path).expect_err("truncated"),
            LedgerError::Corrupt { .. }
        ));

        write(&path, &[0xFF, 0xFE, 0x00]);
        assert!(matches!(
            read_value(&path).expect_err("not utf-8"),
            LedgerError::Corrupt { .. }
        ));
    }

    #[test]
    fn test_read_collection_applies_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sales.json");

        write(&path, br#"[{"id": "abc123", "amount": 500}]"#);
        let collection = read_collection(&path, DatasetKind::Sales).expect("valid list");
        assert_eq!(collection.len(), 1);

        let err = read_collection(&path, DatasetKind::Rooms).expect_err("list is not a map");
        assert!(matches!(err, LedgerError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_encode_is_stable_across_roundtrips() {
        let mut record = Record::new();
        record.set("id", "abc123");
        record.set("amount", 500);
        record.set("status", "Pending");
        let collection = Collection::Records(vec![record]);

        let first = encode_collection(&collection).expect("encode");
        let parsed: Value = serde_json::from_slice(&first).expect("parse");
        let reparsed =
            Collection::from_value(DatasetKind::Sales, parsed).expect("shape survives");
        let second = encode_collection(&reparsed).expect("encode again");
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_rooms_sorts_keys() {
        let tenant = Tenant::new("hotel1").expect("valid tenant");
        let collection = Collection::Rooms(innledger_types::default_rooms(&tenant));
        let bytes = encode_collection(&collection).expect("encode");
        let text = String::from_utf8(bytes).expect("utf-8");
        let pos_101 = text.find("\"101\"").expect("room 101");
        let pos_108 = text.find("\"108\"").expect("room 108");
        assert!(pos_101 < pos_108);
    }

    #[test]
    fn test_encode_ends_with_newline() {
        let bytes = encode_value(&json!([])).expect("encode");
        assert_eq!(bytes.last(), Some(&b'\n'));
    }
}
