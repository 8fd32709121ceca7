//! Records, room state, and the parsed form of a dataset file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use innledger_error::{LedgerError, Result};

use crate::{DatasetKind, DatasetShape, Tenant};

/// One bookkeeping record: an ordered field map with an `id` and
/// dataset-specific fields.
///
/// Field order is insertion-stable (`serde_json`'s `preserve_order`), so a
/// record round-trips through disk byte-identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// The record id, when present and a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Numeric view of a field: numbers pass through, numeric strings parse.
    #[must_use]
    pub fn f64_field(&self, field: &str) -> Option<f64> {
        match self.0.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Whether a field is present and not `null`.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|v| !v.is_null())
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Coerce the named fields to JSON numbers in place.
    ///
    /// Present, non-null values become `f64`: numbers convert, numeric
    /// strings parse, anything else collapses to `0.0`. Absent and null
    /// fields are left untouched.
    pub fn coerce_numeric(&mut self, fields: &[&str]) {
        for &field in fields {
            let Some(value) = self.0.get(field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let parsed = match value {
                Value::Number(n) => n.as_f64().unwrap_or(0.0),
                Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
                _ => 0.0,
            };
            let number = Number::from_f64(parsed).unwrap_or_else(|| Number::from(0));
            self.0.insert(field.to_owned(), Value::Number(number));
        }
    }

    /// Give bare `YYYY-MM-DD` strings in the named fields a midnight time
    /// component, matching the canonical `YYYY-MM-DD HH:MM:SS` format.
    pub fn normalize_dates(&mut self, fields: &[&str]) {
        for &field in fields {
            if let Some(Value::String(s)) = self.0.get_mut(field) {
                if s.len() == 10 {
                    s.push_str(" 00:00:00");
                }
            }
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn default_status() -> String {
    "Available".to_owned()
}

fn default_room_type() -> String {
    "Standard".to_owned()
}

fn default_price() -> Number {
    Number::from(2000u32)
}

/// State of one hotel room, keyed by room number in the rooms dataset.
///
/// The field defaults make partially-written legacy entries load instead of
/// tripping the fallback cascade; a missing `room_number` is backfilled from
/// the map key during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    #[serde(default)]
    pub room_number: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(rename = "type", default = "default_room_type")]
    pub room_type: String,
    #[serde(default = "default_price")]
    pub price: Number,
    #[serde(default)]
    pub current_guest: Option<String>,
    #[serde(default)]
    pub checkin_date: Option<String>,
    #[serde(default)]
    pub checkout_date: Option<String>,
    #[serde(default)]
    pub guest_phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoomState {
    /// A vacant standard room at the default rate.
    #[must_use]
    pub fn vacant(room_number: impl Into<String>) -> Self {
        Self {
            room_number: room_number.into(),
            status: default_status(),
            room_type: default_room_type(),
            price: default_price(),
            current_guest: None,
            checkin_date: None,
            checkout_date: None,
            guest_phone: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == "Available"
    }
}

/// The tenant-specific room layout synthesized when every recovery source for
/// the rooms dataset has failed.
///
/// "hotel1" carries 8 rooms (101–108); "hotel2" carries 17 (101–103, 201–203,
/// 301–305, 401–403, 501–503). Unknown tenants get an empty layout.
#[must_use]
pub fn default_rooms(tenant: &Tenant) -> BTreeMap<String, RoomState> {
    let numbers: Vec<u32> = match tenant.as_str() {
        "hotel1" => (101..=108).collect(),
        "hotel2" => {
            let mut numbers = Vec::with_capacity(17);
            for floor in [1u32, 2, 3, 4, 5] {
                let start = floor * 100 + 1;
                let count = if floor == 3 { 5 } else { 3 };
                numbers.extend(start..start + count);
            }
            numbers
        }
        _ => Vec::new(),
    };
    numbers
        .into_iter()
        .map(|n| (n.to_string(), RoomState::vacant(n.to_string())))
        .collect()
}

/// Parsed content of one dataset file.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    /// Ordered record list (every dataset except rooms).
    Records(Vec<Record>),
    /// Room number → state map (the rooms dataset). `BTreeMap` keeps key
    /// order sorted, so serialization is deterministic.
    Rooms(BTreeMap<String, RoomState>),
}

impl Collection {
    /// The empty collection of the dataset's declared shape.
    #[must_use]
    pub fn empty_for(kind: DatasetKind) -> Self {
        match kind.shape() {
            DatasetShape::RecordList => Self::Records(Vec::new()),
            DatasetShape::RoomMap => Self::Rooms(BTreeMap::new()),
        }
    }

    /// The collection synthesized when all recovery sources fail: the
    /// tenant's default room layout for rooms, empty otherwise.
    #[must_use]
    pub fn synthesized_default(kind: DatasetKind, tenant: &Tenant) -> Self {
        match kind.shape() {
            DatasetShape::RecordList => Self::Records(Vec::new()),
            DatasetShape::RoomMap => Self::Rooms(default_rooms(tenant)),
        }
    }

    /// Interpret parsed JSON as this dataset's declared shape.
    ///
    /// Shape violations are reported as [`LedgerError::ShapeMismatch`]; the
    /// fallback cascade treats them exactly like unparseable content.
    pub fn from_value(kind: DatasetKind, value: Value) -> Result<Self> {
        match kind.shape() {
            DatasetShape::RecordList => match value {
                Value::Array(items) => {
                    let mut records = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Object(fields) => records.push(Record(fields)),
                            _ => {
                                return Err(shape_mismatch(kind, "non-map element"));
                            }
                        }
                    }
                    Ok(Self::Records(records))
                }
                Value::Object(_) => Err(shape_mismatch(kind, "map")),
                _ => Err(shape_mismatch(kind, "scalar")),
            },
            DatasetShape::RoomMap => match value {
                Value::Object(entries) => {
                    let mut rooms = BTreeMap::new();
                    for (number, entry) in entries {
                        let mut state: RoomState = serde_json::from_value(entry)
                            .map_err(|_| shape_mismatch(kind, "malformed room entry"))?;
                        if state.room_number.is_empty() {
                            state.room_number.clone_from(&number);
                        }
                        rooms.insert(number, state);
                    }
                    Ok(Self::Rooms(rooms))
                }
                Value::Array(_) => Err(shape_mismatch(kind, "array")),
                _ => Err(shape_mismatch(kind, "scalar")),
            },
        }
    }

    #[must_use]
    pub fn shape(&self) -> DatasetShape {
        match self {
            Self::Records(_) => DatasetShape::RecordList,
            Self::Rooms(_) => DatasetShape::RoomMap,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::Rooms(rooms) => rooms.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Self::Records(records) => Some(records),
            Self::Rooms(_) => None,
        }
    }

    #[must_use]
    pub fn as_records_mut(&mut self) -> Option<&mut Vec<Record>> {
        match self {
            Self::Records(records) => Some(records),
            Self::Rooms(_) => None,
        }
    }

    #[must_use]
    pub fn as_rooms(&self) -> Option<&BTreeMap<String, RoomState>> {
        match self {
            Self::Rooms(rooms) => Some(rooms),
            Self::Records(_) => None,
        }
    }

    #[must_use]
    pub fn as_rooms_mut(&mut self) -> Option<&mut BTreeMap<String, RoomState>> {
        match self {
            Self::Rooms(rooms) => Some(rooms),
            Self::Records(_) => None,
        }
    }
}

impl Serialize for Collection {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Records(records) => records.serialize(serializer),
            Self::Rooms(rooms) => rooms.serialize(serializer),
        }
    }
}

fn shape_mismatch(kind: DatasetKind, found: &'static str) -> LedgerError {
    let expected = match kind.shape() {
        DatasetShape::RecordList => "array of records",
        DatasetShape::RoomMap => "map of room states",
    };
    LedgerError::ShapeMismatch {
        dataset: kind.name().to_owned(),
        expected,
        found,
    }
}
