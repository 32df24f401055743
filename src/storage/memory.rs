//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::KeyValueStore;
use crate::types::errors::StorageError;

/// A `HashMap` behind a `RwLock`, optionally capped at a total byte size.
///
/// The quota counts the bytes of every key and value, which is how browser
/// storage limits behave; a write that would cross it fails with
/// [`StorageError::QuotaExceeded`] and leaves the store unchanged.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryStore {
    /// Creates an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store holding at most `quota_bytes` of keys and values.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes of keys and values currently stored.
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .map(|items| items.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Unavailable("in-memory store lock poisoned".to_string())
}

impl KeyValueStore for InMemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(poisoned)?;

        if let Some(limit) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(poisoned)?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.keys().cloned().collect())
    }
}
