//! SQLite backend
//!
//! Keeps every key in a single table of one database file:
//!
//! ```sql
//! CREATE TABLE kv_store (key TEXT PRIMARY KEY, value TEXT NOT NULL)
//! ```

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv::KeyValueStore;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the database inside the data directory
pub const DATABASE_FILE: &str = "hostel.db";

/// SQLite-backed key-value store (std::sync::Mutex because Connection is !Sync)
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create or open `hostel.db` in `data_dir`
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DATABASE_FILE);

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Self::init(conn, Some(path))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        if let Some(ref p) = path {
            tracing::debug!("Opened SQLite store at {:?}", p);
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire SQLite lock: {}", e)))
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT value FROM kv_store WHERE key = ?1")?;
        let value = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
