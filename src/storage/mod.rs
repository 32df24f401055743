//! Key-value storage adapters.
//!
//! The route history only needs a synchronous string-to-string store with
//! get/set/remove/list-keys. [`KeyValueStore`] is that seam; the crate ships
//! an in-memory adapter for tests and ephemeral use, and a SQLite-backed one
//! for persistence.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use crate::types::errors::StorageError;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Synchronous persistent string storage.
///
/// Adapters report every failure explicitly; a missing key is `Ok(None)`,
/// not an error.
pub trait KeyValueStore {
    /// Reads the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Deleting a missing key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently stored, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

// Lets several components share one store.
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}
