//! Core data types for the hostel record store
//!
//! This module defines the fundamental types used throughout the storage layer:
//! - `Record`: A single persisted request or complaint
//! - `NewRecord`: Caller input for creating a record
//! - `CollectionKind`: Which collection a record belongs to

use crate::storage::error::{StorageError, StorageResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Storage key of the requests collection
pub const REQUESTS_KEY: &str = "hms_requests";

/// Storage key of the complaints collection
pub const COMPLAINTS_KEY: &str = "hms_complaints";

/// The two record collections kept by the store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Student requests (room change, maintenance, leave, ...)
    Requests,
    /// Complaints handled by wardens
    Complaints,
}

impl CollectionKind {
    /// Get all collection kinds for iteration
    pub fn all() -> &'static [CollectionKind] {
        &[CollectionKind::Requests, CollectionKind::Complaints]
    }

    /// Key under which the collection is persisted
    pub fn key(&self) -> &'static str {
        match self {
            CollectionKind::Requests => REQUESTS_KEY,
            CollectionKind::Complaints => COMPLAINTS_KEY,
        }
    }

    /// Status given to a record created without one
    pub fn default_status(&self) -> &'static str {
        match self {
            CollectionKind::Requests => "Pending",
            CollectionKind::Complaints => "Open",
        }
    }

    /// Priority given to a record created without one, if the kind has priorities
    pub fn default_priority(&self) -> Option<&'static str> {
        match self {
            CollectionKind::Requests => None,
            CollectionKind::Complaints => Some("Medium"),
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Requests => write!(f, "requests"),
            CollectionKind::Complaints => write!(f, "complaints"),
        }
    }
}

impl FromStr for CollectionKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requests" | "request" => Ok(CollectionKind::Requests),
            "complaints" | "complaint" => Ok(CollectionKind::Complaints),
            other => Err(StorageError::InvalidKey(format!(
                "unknown collection '{}'",
                other
            ))),
        }
    }
}

/// A single request or complaint
///
/// `id`, `status` and `date` are owned by the store. Everything else the
/// caller supplied lives in the extension map, so the persisted form is one
/// flat JSON object per record.
///
/// A persisted record whose `id`, `status` or `date` is missing or of an
/// unexpected type reads with a fallback (`0` or empty text) and is written
/// back exactly as it was found, as long as that field was not changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    /// Unique within the collection, assigned by the store
    pub id: u64,
    /// Free-form status string
    pub status: String,
    /// Creation date as `YYYY-MM-DD`
    pub date: String,
    fields: Map<String, Value>,
    found: Found,
}

/// Persisted form of the store-owned fields when it was not canonical
#[derive(Debug, Clone, Default, PartialEq)]
struct Found {
    id: Option<Original>,
    status: Option<Original>,
    date: Option<Original>,
}

#[derive(Debug, Clone, PartialEq)]
enum Original {
    Absent,
    Value(Value),
}

impl Original {
    fn read_id(entry: Option<Value>) -> (u64, Option<Original>) {
        match entry {
            None => (0, Some(Original::Absent)),
            Some(value) => match value.as_u64() {
                Some(id) => (id, None),
                None => (id_from_value(&value), Some(Original::Value(value))),
            },
        }
    }

    fn read_text(entry: Option<Value>) -> (String, Option<Original>) {
        match entry {
            None => (String::new(), Some(Original::Absent)),
            Some(Value::String(text)) => (text, None),
            Some(value) => (value_to_text(value.clone()), Some(Original::Value(value))),
        }
    }

    fn reads_as_id(&self, id: u64) -> bool {
        match self {
            Original::Absent => id == 0,
            Original::Value(value) => id_from_value(value) == id,
        }
    }

    fn reads_as_text(&self, text: &str) -> bool {
        match self {
            Original::Absent => text.is_empty(),
            Original::Value(value) => value_to_text(value.clone()) == text,
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(mut map: Map<String, Value>) -> Self {
        let (id, found_id) = Original::read_id(map.remove("id"));
        let (status, found_status) = Original::read_text(map.remove("status"));
        let (date, found_date) = Original::read_text(map.remove("date"));

        Record {
            id,
            status,
            date,
            fields: map,
            found: Found {
                id: found_id,
                status: found_status,
                date: found_date,
            },
        }
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        let Record {
            id,
            status,
            date,
            fields,
            found,
        } = record;

        let mut map = Map::new();
        match found.id {
            Some(original) if original.reads_as_id(id) => put(&mut map, "id", original),
            _ => {
                map.insert("id".to_string(), Value::from(id));
            }
        }
        for (key, text, original) in [("status", status, found.status), ("date", date, found.date)] {
            match original {
                Some(original) if original.reads_as_text(&text) => put(&mut map, key, original),
                _ => {
                    map.insert(key.to_string(), Value::String(text));
                }
            }
        }
        map.extend(fields);
        map
    }
}

fn put(map: &mut Map<String, Value>, key: &str, original: Original) {
    if let Original::Value(value) = original {
        map.insert(key.to_string(), value);
    }
}

impl Record {
    /// Get an extension field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get an extension field as a string, if it is one
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Complaint priority
    pub fn priority(&self) -> Option<&str> {
        self.text("priority")
    }

    /// All extension fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Caller input for `RecordStore::add`
///
/// Collects the fields of a record that does not exist yet. An `id` given
/// here is discarded because the store always assigns it.
///
/// ```
/// use hostel_records::storage::NewRecord;
///
/// let new = NewRecord::new()
///     .field("type", "Room Change")
///     .field("description", "noisy");
/// assert_eq!(new.get("type"), Some(serde_json::json!("Room Change")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRecord {
    status: Option<String>,
    date: Option<String>,
    fields: Map<String, Value>,
}

impl NewRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set any field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Builder method: override the default status
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder method: override the creation date
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Build from a JSON object
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut new = Self::new();
        for (key, value) in map {
            new.insert(key, value);
        }
        new
    }

    /// Parse a JSON object literal
    pub fn from_json(text: &str) -> StorageResult<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(StorageError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Look up a caller-supplied field (status and date included)
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "status" => self.status.clone().map(Value::String),
            "date" => self.date.clone().map(Value::String),
            _ => self.fields.get(key).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.date.is_none() && self.fields.is_empty()
    }

    fn insert(&mut self, key: String, value: Value) {
        match key.as_str() {
            "id" => {}
            "status" => self.status = Some(value_to_text(value)),
            "date" => self.date = Some(value_to_text(value)),
            _ => {
                self.fields.insert(key, value);
            }
        }
    }

    /// Layer caller fields over the collection defaults; `id` is authoritative
    pub(crate) fn into_record(self, kind: CollectionKind, id: u64, today: String) -> Record {
        let mut fields = Map::new();
        if let Some(priority) = kind.default_priority() {
            fields.insert("priority".to_string(), Value::from(priority));
        }
        fields.extend(self.fields);

        Record {
            id,
            status: self
                .status
                .unwrap_or_else(|| kind.default_status().to_string()),
            date: self.date.unwrap_or(today),
            fields,
            found: Found::default(),
        }
    }
}

/// Current UTC calendar date as `YYYY-MM-DD`
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Numeric value of a persisted id; anything that is not a non-negative
/// whole number counts as 0
pub(crate) fn id_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        _ => 0,
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_defaults() {
        assert_eq!(CollectionKind::Requests.key(), "hms_requests");
        assert_eq!(CollectionKind::Complaints.key(), "hms_complaints");
        assert_eq!(CollectionKind::Requests.default_status(), "Pending");
        assert_eq!(CollectionKind::Complaints.default_status(), "Open");
        assert_eq!(CollectionKind::Requests.default_priority(), None);
        assert_eq!(CollectionKind::Complaints.default_priority(), Some("Medium"));
    }

    #[test]
    fn test_collection_kind_parse() {
        assert_eq!("requests".parse::<CollectionKind>().unwrap(), CollectionKind::Requests);
        assert_eq!("Complaint".parse::<CollectionKind>().unwrap(), CollectionKind::Complaints);
        assert!("notices".parse::<CollectionKind>().is_err());
    }

    #[test]
    fn test_record_flattens_extension_fields() {
        let record: Record = serde_json::from_value(json!({
            "id": 3,
            "status": "Open",
            "date": "2024-01-15",
            "student": "John Doe",
            "priority": "High"
        }))
        .unwrap();

        assert_eq!(record.id, 3);
        assert_eq!(record.status, "Open");
        assert_eq!(record.text("student"), Some("John Doe"));
        assert_eq!(record.priority(), Some("High"));
        assert!(record.get("id").is_none());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["student"], "John Doe");
        assert_eq!(back["id"], 3);
    }

    #[test]
    fn test_lenient_id() {
        let missing: Record = serde_json::from_value(json!({"status": "Open"})).unwrap();
        assert_eq!(missing.id, 0);

        let text: Record = serde_json::from_value(json!({"id": "seven"})).unwrap();
        assert_eq!(text.id, 0);

        let negative: Record = serde_json::from_value(json!({"id": -4})).unwrap();
        assert_eq!(negative.id, 0);

        let whole_float: Record = serde_json::from_value(json!({"id": 5.0})).unwrap();
        assert_eq!(whole_float.id, 5);
    }

    #[test]
    fn test_foreign_fields_written_back_unchanged() {
        let raw = r#"[{"id":"seven","status":null,"type":"Noise","note":"z","extra":1},{"status":3,"date":20240115,"type":"Leave"}]"#;
        let records: Vec<Record> = serde_json::from_str(raw).unwrap();

        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].status, "");
        assert_eq!(records[1].status, "3");
        assert_eq!(records[1].date, "20240115");

        assert_eq!(serde_json::to_string(&records).unwrap(), raw);
    }

    #[test]
    fn test_changed_foreign_status_is_written_as_text() {
        let mut record: Record = serde_json::from_str(r#"{"id":-4,"status":null}"#).unwrap();
        record.status = "Resolved".to_string();

        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"id":-4,"status":"Resolved"}"#
        );
    }

    #[test]
    fn test_new_record_discards_id() {
        assert!(NewRecord::new().field("id", 99).is_empty());

        let new = NewRecord::new().field("id", 99).field("type", "Noise");
        assert!(new.get("id").is_none());

        let record = new.into_record(CollectionKind::Complaints, 2, "2024-01-20".into());
        assert_eq!(record.id, 2);
        assert_eq!(record.status, "Open");
        assert_eq!(record.priority(), Some("Medium"));
    }

    #[test]
    fn test_new_record_caller_fields_override_defaults() {
        let record = NewRecord::new()
            .field("status", "Approved")
            .field("priority", "High")
            .field("date", "2024-01-10")
            .into_record(CollectionKind::Complaints, 1, "2024-01-20".into());

        assert_eq!(record.status, "Approved");
        assert_eq!(record.date, "2024-01-10");
        assert_eq!(record.priority(), Some("High"));
    }

    #[test]
    fn test_new_record_from_json() {
        let new = NewRecord::from_json(r#"{"type": "Maintenance", "status": "Pending"}"#).unwrap();
        assert_eq!(new.get("type"), Some(json!("Maintenance")));
        assert_eq!(new.get("status"), Some(json!("Pending")));

        let err = NewRecord::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord(_)));
    }

    #[test]
    fn test_today_format() {
        let date = today();
        assert_eq!(date.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }
}
