//! Record collections
//!
//! A `RecordStore` is one ordered collection of records (requests or
//! complaints) persisted as a JSON array under a single key.
//!
//! Every mutation is a whole-collection read-modify-write:
//!
//! ```text
//! add:           get_item(key) → decode → push → encode → set_item(key)
//! update_status: get_item(key) → decode → replace status → encode → set_item(key)
//! ```
//!
//! Content that is not a JSON array reads as an empty collection, and array
//! entries that are not objects are skipped. Both are logged and never
//! reported to the caller.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv::KeyValueStore;
use crate::storage::types::{json_type_name, today, CollectionKind, NewRecord, Record};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};

/// One persisted collection of records
pub struct RecordStore {
    kind: CollectionKind,
    backend: Arc<dyn KeyValueStore>,
    /// Serializes read-modify-write cycles through this handle
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(kind: CollectionKind, backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kind,
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Which collection this is
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// All records in insertion order
    ///
    /// Never fails: an absent key, unreadable backend, or content that is
    /// not an array yields an empty list. Non-object entries are left out.
    pub fn list(&self) -> Vec<Record> {
        let raw = match self.backend.get_item(self.kind.key()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    collection = %self.kind,
                    error = %e,
                    "Failed to read collection, treating as empty"
                );
                None
            }
        };

        decode_collection(self.kind, raw.as_deref())
    }

    /// Record with the given id, if present
    pub fn get(&self, id: u64) -> Option<Record> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// Create a record and append it to the collection
    ///
    /// The new id is one more than the largest existing id (1 for an empty
    /// collection). Collection defaults form the base, caller fields are
    /// layered over them, and the assigned id always wins.
    pub fn add(&self, new: NewRecord) -> StorageResult<Record> {
        let _guard = self.lock()?;

        let mut records = self.list();
        let id = next_id(&records).ok_or_else(|| {
            StorageError::InvalidRecord(format!("{} has no ids left to assign", self.kind))
        })?;
        let record = new.into_record(self.kind, id, today());

        records.push(record.clone());
        self.persist(&records)?;

        tracing::debug!(collection = %self.kind, id, "Added record");
        Ok(record)
    }

    /// Set the status of the record with `id`, returning the updated collection
    ///
    /// Every other record and field is left as is. An unknown id changes
    /// nothing; the collection is still written back and returned.
    pub fn update_status(&self, id: u64, status: impl Into<String>) -> StorageResult<Vec<Record>> {
        let status = status.into();
        let _guard = self.lock()?;

        let mut records = self.list();
        let mut matched = false;
        for record in records.iter_mut().filter(|r| r.id == id) {
            record.status = status.clone();
            matched = true;
        }

        self.persist(&records)?;

        if matched {
            tracing::debug!(collection = %self.kind, id, status = %status, "Updated status");
        } else {
            tracing::debug!(collection = %self.kind, id, "No record to update");
        }
        Ok(records)
    }

    /// Record counts for this collection
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary::from_records(self.kind, &self.list())
    }

    /// Write the whole collection back under its key
    fn persist(&self, records: &[Record]) -> StorageResult<()> {
        let content = serde_json::to_string(records)?;
        self.backend.set_item(self.kind.key(), &content)
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire {} lock: {}", self.kind, e)))
    }
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("kind", &self.kind)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Decode persisted collection content, falling back to an empty list
pub fn decode_collection(kind: CollectionKind, raw: Option<&str>) -> Vec<Record> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(collection = %kind, error = %e, "Corrupt collection, treating as empty");
            return Vec::new();
        }
    };

    let items = match value {
        Value::Array(items) => items,
        other => {
            tracing::warn!(
                collection = %kind,
                found = json_type_name(&other),
                "Collection is not an array, treating as empty"
            );
            return Vec::new();
        }
    };

    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                tracing::warn!(
                    collection = %kind,
                    index,
                    found = json_type_name(&item),
                    "Skipping non-object entry"
                );
                return None;
            }
            match serde_json::from_value::<Record>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(collection = %kind, index, error = %e, "Skipping unreadable entry");
                    None
                }
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            collection = %kind,
            kept = records.len(),
            skipped = total - records.len(),
            "Collection held entries that are not records"
        );
    }
    records
}

/// Largest id plus one, or 1 for an empty collection
///
/// `None` when the largest id is already `u64::MAX`.
pub fn next_id(records: &[Record]) -> Option<u64> {
    records.iter().map(|r| r.id).max().unwrap_or(0).checked_add(1)
}

/// Record counts for one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub kind: CollectionKind,
    pub total: usize,
    /// (status, count) in order of first appearance
    pub by_status: Vec<(String, usize)>,
}

impl CollectionSummary {
    pub fn from_records(kind: CollectionKind, records: &[Record]) -> Self {
        let mut by_status: Vec<(String, usize)> = Vec::new();
        for record in records {
            match by_status.iter_mut().find(|(s, _)| *s == record.status) {
                Some((_, count)) => *count += 1,
                None => by_status.push((record.status.clone(), 1)),
            }
        }

        Self {
            kind,
            total: records.len(),
            by_status,
        }
    }

    /// Count for one status (0 if none)
    pub fn count(&self, status: &str) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

impl fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.total)?;
        if !self.by_status.is_empty() {
            let parts: Vec<String> = self
                .by_status
                .iter()
                .map(|(status, n)| {
                    let label = if status.is_empty() { "(none)" } else { status.as_str() };
                    format!("{} {}", label, n)
                })
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;
    use serde_json::json;

    fn create_test_store(kind: CollectionKind) -> (RecordStore, Arc<MemoryStore>) {
        let backend = Arc::new(MemoryStore::new());
        let store = RecordStore::new(kind, backend.clone());
        (store, backend)
    }

    fn request(kind: &str, description: &str) -> NewRecord {
        NewRecord::new()
            .field("type", kind)
            .field("description", description)
    }

    #[test]
    fn test_empty_collection() {
        let (store, _backend) = create_test_store(CollectionKind::Requests);
        assert!(store.list().is_empty());
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_add_request_scenario() {
        let (store, _backend) = create_test_store(CollectionKind::Requests);

        let record = store.add(request("Room Change", "noisy")).unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.status, "Pending");
        assert_eq!(record.date, today());
        assert_eq!(record.text("type"), Some("Room Change"));
        assert_eq!(record.text("description"), Some("noisy"));
        assert!(record.priority().is_none());

        assert_eq!(store.list(), vec![record]);
    }

    #[test]
    fn test_ids_are_sequential() {
        let (store, _backend) = create_test_store(CollectionKind::Requests);

        for expected in 1..=5u64 {
            let record = store
                .add(request("Maintenance", &format!("job {}", expected)))
                .unwrap();
            assert_eq!(record.id, expected);
        }

        let records = store.list();
        assert_eq!(records.len(), 5);
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(records[2].text("description"), Some("job 3"));
    }

    #[test]
    fn test_add_complaint_defaults_priority() {
        let (store, _backend) = create_test_store(CollectionKind::Complaints);

        store
            .add(NewRecord::new().field("student", "John").field("type", "Cleanliness"))
            .unwrap();
        let record = store
            .add(NewRecord::new().field("student", "Jane").field("type", "Noise"))
            .unwrap();

        assert_eq!(record.id, 2);
        assert_eq!(record.status, "Open");
        assert_eq!(record.priority(), Some("Medium"));
        assert_eq!(record.text("student"), Some("Jane"));
    }

    #[test]
    fn test_add_keeps_caller_priority() {
        let (store, _backend) = create_test_store(CollectionKind::Complaints);

        let record = store
            .add(NewRecord::new().field("type", "Facilities").field("priority", "High"))
            .unwrap();
        assert_eq!(record.priority(), Some("High"));
    }

    #[test]
    fn test_caller_id_is_ignored() {
        let (store, _backend) = create_test_store(CollectionKind::Requests);
        store.add(request("Room Change", "first")).unwrap();

        let record = store
            .add(request("Maintenance", "second").field("id", 42))
            .unwrap();
        assert_eq!(record.id, 2);
    }

    #[test]
    fn test_next_id_uses_max_not_count() {
        let (store, backend) = create_test_store(CollectionKind::Requests);
        backend
            .set_item(
                "hms_requests",
                r#"[{"id":1,"status":"Pending"},{"id":3,"status":"Approved"}]"#,
            )
            .unwrap();

        let record = store.add(request("Leave Application", "home")).unwrap();
        assert_eq!(record.id, 4);
    }

    #[test]
    fn test_next_id_treats_bad_ids_as_zero() {
        let (store, backend) = create_test_store(CollectionKind::Requests);
        backend
            .set_item("hms_requests", r#"[{"id":"abc"},{"type":"x"}]"#)
            .unwrap();

        let record = store.add(request("Maintenance", "fix")).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn test_update_status() {
        let (store, _backend) = create_test_store(CollectionKind::Requests);
        let first = store.add(request("Room Change", "noisy")).unwrap();
        let second = store.add(request("Maintenance", "AC")).unwrap();

        let updated = store.update_status(second.id, "Approved").unwrap();

        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0], first);
        assert_eq!(updated[1].status, "Approved");
        assert_eq!(updated[1].id, second.id);
        assert_eq!(updated[1].date, second.date);
        assert_eq!(updated[1].fields(), second.fields());
        assert_eq!(store.list(), updated);
    }

    #[test]
    fn test_update_status_accepts_any_string() {
        let (store, _backend) = create_test_store(CollectionKind::Complaints);
        let record = store.add(NewRecord::new().field("type", "Noise")).unwrap();

        let updated = store.update_status(record.id, "Escalated to dean").unwrap();
        assert_eq!(updated[0].status, "Escalated to dean");
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let (store, backend) = create_test_store(CollectionKind::Requests);
        store.add(request("Room Change", "noisy")).unwrap();
        let before = backend.get_item("hms_requests").unwrap();

        let updated = store.update_status(99, "Rejected").unwrap();

        assert_eq!(updated, store.list());
        assert_eq!(updated[0].status, "Pending");
        assert_eq!(backend.get_item("hms_requests").unwrap(), before);
    }

    #[test]
    fn test_update_on_empty_collection_persists_empty_array() {
        let (store, backend) = create_test_store(CollectionKind::Requests);

        let updated = store.update_status(1, "Approved").unwrap();

        assert!(updated.is_empty());
        assert_eq!(backend.get_item("hms_requests").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_content_reads_empty() {
        let (store, backend) = create_test_store(CollectionKind::Complaints);

        for raw in ["not json at all", r#"{"id":1}"#, "42", "null", "[1, 2]", r#"[null]"#] {
            backend.set_item("hms_complaints", raw).unwrap();
            assert!(store.list().is_empty(), "content {:?}", raw);
        }

        let record = store.add(NewRecord::new().field("type", "Noise")).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_non_object_entries_are_skipped() {
        let (store, backend) = create_test_store(CollectionKind::Requests);
        backend
            .set_item(
                "hms_requests",
                r#"[{"id":1,"status":"Approved","type":"Room Change"},null,5,"x"]"#,
            )
            .unwrap();

        let records = store.list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "Approved");

        let record = store.add(request("Maintenance", "fan")).unwrap();
        assert_eq!(record.id, 2);

        let records = store.list();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].status, "Approved");
        assert_eq!(records[0].text("type"), Some("Room Change"));
    }

    #[test]
    fn test_next_id_exhausted() {
        let (store, backend) = create_test_store(CollectionKind::Requests);

        for raw in [r#"[{"id":18446744073709551615}]"#, r#"[{"id":1e20}]"#] {
            backend.set_item("hms_requests", raw).unwrap();

            let err = store.add(request("Maintenance", "fan")).unwrap_err();
            assert!(matches!(err, StorageError::InvalidRecord(_)), "content {:?}", raw);
            assert_eq!(backend.get_item("hms_requests").unwrap().as_deref(), Some(raw));
        }

        assert_eq!(next_id(&store.list()), None);
        assert_eq!(next_id(&[]), Some(1));
    }

    #[test]
    fn test_roundtrip_preserves_order_and_fields() {
        let (store, backend) = create_test_store(CollectionKind::Complaints);
        let persisted = json!([
            {"id": 3, "student": "Mike Johnson", "type": "Facilities", "status": "In Progress",
             "date": "2024-01-12", "priority": "High", "description": "Broken AC in room 301"},
            {"id": 1, "student": "John Doe", "type": "Noise", "status": "Open",
             "date": "2024-01-15", "priority": "Medium", "tags": ["night", "weekend"]},
        ]);
        backend
            .set_item("hms_complaints", &persisted.to_string())
            .unwrap();

        let records = store.list();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 3);
        assert_eq!(records[1].id, 1);

        store.update_status(1, "Open").unwrap();

        let raw = backend.get_item("hms_complaints").unwrap().unwrap();
        let reread: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(reread, persisted);
        assert_eq!(store.list(), records);
    }

    #[test]
    fn test_collections_are_independent() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let requests = RecordStore::new(CollectionKind::Requests, backend.clone());
        let complaints = RecordStore::new(CollectionKind::Complaints, backend);

        requests.add(request("Room Change", "noisy")).unwrap();
        requests.add(request("Maintenance", "AC")).unwrap();
        let complaint = complaints.add(NewRecord::new().field("type", "Noise")).unwrap();

        assert_eq!(complaint.id, 1);
        assert_eq!(requests.list().len(), 2);
        assert_eq!(complaints.list().len(), 1);
    }

    #[test]
    fn test_summary() {
        let (store, _backend) = create_test_store(CollectionKind::Requests);
        store.add(request("Room Change", "a")).unwrap();
        store.add(request("Maintenance", "b")).unwrap();
        store.add(request("Maintenance", "c")).unwrap();
        store.update_status(2, "Approved").unwrap();

        let summary = store.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count("Pending"), 2);
        assert_eq!(summary.count("Approved"), 1);
        assert_eq!(summary.count("Rejected"), 0);
        assert_eq!(summary.to_string(), "requests: 3 (Pending 2, Approved 1)");
    }

    #[test]
    fn test_decode_absent_is_empty() {
        assert!(decode_collection(CollectionKind::Requests, None).is_empty());
        assert!(decode_collection(CollectionKind::Requests, Some("[]")).is_empty());
    }
}
