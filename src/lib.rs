//! # Hostel Records
//!
//! Request and complaint store for hostel management dashboards.
//!
//! Students file requests (room change, maintenance, leave) and complaints;
//! wardens and admins move them through their statuses. Each collection is
//! persisted as one JSON array under a fixed key of a key-value backend.
//!
//! ## Features
//!
//! - **Sequential ids**: every new record gets the largest id plus one
//! - **Fail-soft reads**: unreadable or corrupt collections read as empty
//! - **Pluggable backends**: JSON files, SQLite, or memory
//! - **Reports**: status summaries and CSV/JSON export
//!
//! ## Modules
//!
//! - [`storage`]: Record collections and key-value backends
//! - [`workflow`]: Conventional status transitions
//! - [`report`]: Table, JSON and CSV rendering
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use hostel_records::storage::{HostelStore, NewRecord};
//!
//! let store = HostelStore::in_memory();
//!
//! let complaint = store
//!     .complaints()
//!     .add(NewRecord::new().field("student", "Jane").field("type", "Noise"))
//!     .unwrap();
//! assert_eq!(complaint.id, 1);
//! assert_eq!(complaint.status, "Open");
//! assert_eq!(complaint.priority(), Some("Medium"));
//!
//! let all = store.complaints().update_status(complaint.id, "Resolved").unwrap();
//! assert_eq!(all[0].status, "Resolved");
//! ```

pub mod config;
pub mod report;
pub mod storage;
pub mod workflow;

// Re-export top-level types for convenience
pub use storage::{
    BackendKind, CollectionKind, CollectionSummary, HostelStats, HostelStore, KeyValueStore,
    NewRecord, Record, RecordStore, StorageConfig, StorageError, StorageResult,
};

pub use config::{Config, ConfigError, LoggingConfig, StorageConfig as ConfigStorageConfig};

pub use report::ExportFormat;

pub use workflow::TransitionError;
