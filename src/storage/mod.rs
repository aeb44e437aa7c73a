//! Hostel Record Storage
//!
//! This module provides the record store behind the hostel dashboards:
//!
//! - **types**: Core data structures (Record, NewRecord, CollectionKind)
//! - **kv**: Key-value backend trait and the in-memory backend
//! - **file**: One JSON file per key
//! - **sqlite**: Single-table SQLite backend
//! - **collection**: Record collections (list, add, update_status)
//! - **engine**: Store handle owning a backend and both collections
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   NewRecord → defaults + caller fields + id → append → JSON array → set_item
//!
//! Read Path:
//!   get_item → JSON array → Vec<Record>   (anything else → empty)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use hostel_records::storage::{HostelStore, NewRecord, StorageConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = HostelStore::open(&StorageConfig::new("./data"))?;
//!
//!     let request = store.requests().add(
//!         NewRecord::new()
//!             .field("type", "Room Change")
//!             .field("description", "Noise from the corridor"),
//!     )?;
//!
//!     store.requests().update_status(request.id, "Approved")?;
//!     println!("{} requests", store.requests().list().len());
//!
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod engine;
pub mod error;
pub mod file;
pub mod kv;
pub mod sqlite;
pub mod types;

// Re-export commonly used types
pub use collection::{decode_collection, next_id, CollectionSummary, RecordStore};
pub use engine::{BackendKind, HostelStats, HostelStore, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use sqlite::SqliteStore;
pub use types::{today, CollectionKind, NewRecord, Record, COMPLAINTS_KEY, REQUESTS_KEY};
