//! Key-value backends
//!
//! The record store persists each collection as one string under one key.
//! Anything that can get, set and remove strings by key can back it:
//! this module holds the trait and the in-memory implementation, the
//! file and SQLite implementations live next to it.

use crate::storage::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// String-keyed persistent storage
///
/// Reads and writes are whole-value: there is no partial update and no
/// coordination between separate handles on the same underlying data.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Short backend name for logs and stats
    fn name(&self) -> &'static str;
}

/// Volatile backend, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire memory store lock: {}", e)))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire memory store lock: {}", e)))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire memory store lock: {}", e)))?;
        items.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
