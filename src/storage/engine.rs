//! Hostel store
//!
//! Owns one key-value backend and the two record collections built on it.
//! Callers get the store handle passed in explicitly instead of reaching
//! for ambient global storage.

use crate::storage::collection::{CollectionSummary, RecordStore};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::file::FileStore;
use crate::storage::kv::{KeyValueStore, MemoryStore};
use crate::storage::sqlite::SqliteStore;
use crate::storage::types::{CollectionKind, NewRecord};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Which key-value backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per collection
    #[default]
    File,
    /// Single SQLite database
    Sqlite,
    /// Nothing persisted
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" | "json" => Ok(BackendKind::File),
            "sqlite" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            other => Err(StorageError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

/// Configuration for opening a store
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for persisted data
    pub data_dir: PathBuf,
    /// Backend kind
    pub backend: BackendKind,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("hostel_data"),
            backend: BackendKind::File,
        }
    }
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Builder method: set the backend
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }
}

/// Handle over both hostel collections
pub struct HostelStore {
    backend: Arc<dyn KeyValueStore>,
    requests: RecordStore,
    complaints: RecordStore,
}

impl HostelStore {
    /// Build on an existing backend
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            requests: RecordStore::new(CollectionKind::Requests, backend.clone()),
            complaints: RecordStore::new(CollectionKind::Complaints, backend.clone()),
            backend,
        }
    }

    /// Open the backend described by `config`
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let backend: Arc<dyn KeyValueStore> = match config.backend {
            BackendKind::File => Arc::new(FileStore::open(&config.data_dir)?),
            BackendKind::Sqlite => Arc::new(SqliteStore::open(&config.data_dir)?),
            BackendKind::Memory => Arc::new(MemoryStore::new()),
        };

        tracing::info!(
            "Opened {} store at {:?}",
            config.backend,
            config.data_dir
        );
        Ok(Self::new(backend))
    }

    /// Store that keeps nothing after drop
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn requests(&self) -> &RecordStore {
        &self.requests
    }

    pub fn complaints(&self) -> &RecordStore {
        &self.complaints
    }

    /// Collection by kind
    pub fn collection(&self, kind: CollectionKind) -> &RecordStore {
        match kind {
            CollectionKind::Requests => &self.requests,
            CollectionKind::Complaints => &self.complaints,
        }
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Summaries of both collections
    pub fn stats(&self) -> HostelStats {
        HostelStats {
            backend: self.backend.name(),
            requests: self.requests.summary(),
            complaints: self.complaints.summary(),
        }
    }

    /// Load sample records into collections that are still empty
    ///
    /// Returns how many records were added. Non-empty collections are left
    /// alone, so running this twice adds nothing the second time.
    pub fn seed_demo(&self) -> StorageResult<usize> {
        let mut added = 0;

        if self.requests.list().is_empty() {
            for new in demo_requests() {
                self.requests.add(new)?;
                added += 1;
            }
        }

        if self.complaints.list().is_empty() {
            for new in demo_complaints() {
                self.complaints.add(new)?;
                added += 1;
            }
        }

        tracing::info!("Seeded {} demo records", added);
        Ok(added)
    }
}

impl fmt::Debug for HostelStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostelStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct HostelStats {
    pub backend: &'static str,
    pub requests: CollectionSummary,
    pub complaints: CollectionSummary,
}

impl HostelStats {
    /// Requests still waiting for a decision
    pub fn pending_requests(&self) -> usize {
        self.requests.count("Pending")
    }

    /// Complaints not yet resolved
    pub fn active_complaints(&self) -> usize {
        self.complaints.total - self.complaints.count("Resolved")
    }
}

impl fmt::Display for HostelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Backend: {}, Requests: {} ({} pending), Complaints: {} ({} active)",
            self.backend,
            self.requests.total,
            self.pending_requests(),
            self.complaints.total,
            self.active_complaints()
        )
    }
}

fn demo_requests() -> Vec<NewRecord> {
    vec![
        NewRecord::new()
            .field("student", "John Doe")
            .field("type", "Room Change")
            .field("description", "Request for room change due to noise issues")
            .field("priority", "Medium")
            .date("2024-01-15"),
        NewRecord::new()
            .field("student", "Jane Smith")
            .field("type", "Maintenance")
            .field("description", "Fix broken AC in room 205")
            .field("priority", "High")
            .status("Approved")
            .date("2024-01-10"),
        NewRecord::new()
            .field("student", "Mike Johnson")
            .field("type", "Leave Application")
            .field("priority", "Low")
            .date("2024-01-12"),
    ]
}

fn demo_complaints() -> Vec<NewRecord> {
    vec![
        NewRecord::new()
            .field("student", "John Doe")
            .field("type", "Noise")
            .field("description", "Loud music from room 205")
            .date("2024-01-15"),
        NewRecord::new()
            .field("student", "Jane Smith")
            .field("type", "Cleanliness")
            .field("description", "Bathroom cleaning issue")
            .field("priority", "Low")
            .status("Resolved")
            .date("2024-01-10"),
        NewRecord::new()
            .field("student", "Mike Johnson")
            .field("type", "Facilities")
            .field("description", "Broken AC in room 301")
            .field("priority", "High")
            .status("In Progress")
            .date("2024-01-12"),
    ]
}
