//! SQLite-backed key-value store.
//!
//! Stores every key in the `kv_store` table created by the schema
//! migrations, so the history survives restarts.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};

use super::KeyValueStore;
use crate::database::Database;
use crate::types::errors::StorageError;

/// Key-value store persisted in a SQLite database.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Wraps an already-migrated database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens (or creates) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Returns the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.connection().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Self::now()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare("SELECT key FROM kv_store")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}
