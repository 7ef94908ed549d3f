//! SQLite-backed key/value store used as the collection cache backing.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use caddy_core::errors::LocalStoreError;
use caddy_core::sync::LocalStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// String-keyed persistent store over a single SQLite table.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LocalStoreError> {
        let conn = Connection::open(path).map_err(to_store_error)?;
        Self::with_connection(conn)
    }

    /// Open an ephemeral in-memory store.
    pub fn open_in_memory() -> Result<Self, LocalStoreError> {
        let conn = Connection::open_in_memory().map_err(to_store_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, LocalStoreError> {
        conn.execute(SCHEMA, []).map_err(to_store_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LocalStoreError> {
        self.conn
            .lock()
            .map_err(|_| LocalStoreError::new("kv store lock poisoned"))
    }
}

fn to_store_error(err: rusqlite::Error) -> LocalStoreError {
    LocalStoreError::new(err.to_string())
}

impl LocalStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(to_store_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(to_store_error)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(to_store_error)?;
        Ok(())
    }
}
