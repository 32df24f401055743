//! Route History Cache.
//!
//! Implements `RouteHistoryTrait`: a bounded, reverse-chronological history
//! of computed routes kept in a [`KeyValueStore`]. The index of
//! [`HistoryEntry`] summaries lives under one key; each full
//! [`RoutePayload`] lives under its entry's id.
//!
//! History is a convenience for the surrounding application, so none of the
//! public operations fail: storage and encoding errors are logged and turned
//! into an empty list, `None`, or `false`.

use tracing::{debug, warn};

use crate::services::clock::{Clock, SystemClock};
use crate::storage::KeyValueStore;
use crate::types::errors::HistoryError;
use crate::types::history::{is_route_id, HistoryEntry};
use crate::types::route::RoutePayload;
use crate::types::settings::HistorySettings;

/// Trait defining route history operations.
pub trait RouteHistoryTrait {
    fn add(&mut self, payload: &RoutePayload) -> Option<String>;
    fn list(&self) -> Vec<HistoryEntry>;
    fn get(&self, id: &str) -> Option<RoutePayload>;
    fn get_entry(&self, id: &str) -> Option<HistoryEntry>;
    fn remove(&mut self, id: &str) -> bool;
    fn clear(&mut self) -> bool;
    fn toggle_favorite(&mut self, id: &str) -> bool;
    fn list_favorites(&self) -> Vec<HistoryEntry>;
    fn prune_orphans(&mut self) -> usize;
}

/// Route history backed by a key-value store.
pub struct RouteHistoryCache<S> {
    store: S,
    settings: HistorySettings,
    clock: Box<dyn Clock + Send + Sync>,
}

impl<S: KeyValueStore> RouteHistoryCache<S> {
    /// Creates a cache over `store` with default settings and the system clock.
    pub fn new(store: S) -> Self {
        Self::with_settings(store, HistorySettings::default())
    }

    pub fn with_settings(store: S, settings: HistorySettings) -> Self {
        Self::with_clock(store, settings, SystemClock)
    }

    pub fn with_clock<C>(store: S, settings: HistorySettings, clock: C) -> Self
    where
        C: Clock + Send + Sync + 'static,
    {
        Self {
            store,
            settings,
            clock: Box::new(clock),
        }
    }

    pub fn settings(&self) -> &HistorySettings {
        &self.settings
    }

    /// Replaces the settings. A smaller capacity takes effect on the next add.
    pub fn set_settings(&mut self, settings: HistorySettings) {
        self.settings = settings;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads and decodes the index. A missing index is an empty history.
    fn load_index(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        match self.store.get_item(&self.settings.index_key)? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(Vec::new()),
        }
    }

    /// Like `load_index`, but a corrupt index reads as empty so that the next
    /// write replaces it.
    fn load_index_or_reset(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        match self.load_index() {
            Err(HistoryError::Serialization(e)) => {
                warn!(key = %self.settings.index_key, error = %e, "discarding corrupt history index");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn save_index(&self, index: &[HistoryEntry]) -> Result<(), HistoryError> {
        let text = serde_json::to_string(index)?;
        self.store.set_item(&self.settings.index_key, &text)?;
        Ok(())
    }

    /// Picks the creation time of a new entry: the clock, nudged past the
    /// newest indexed entry so ids stay unique within one millisecond.
    fn next_timestamp(&self, index: &[HistoryEntry]) -> Result<i64, HistoryError> {
        let now = self.clock.now_millis();
        match index.iter().map(|e| e.timestamp).max() {
            Some(newest) if now <= newest => newest
                .checked_add(1)
                .ok_or(HistoryError::TimestampOverflow(newest)),
            _ => Ok(now),
        }
    }

    fn try_add(&self, payload: &RoutePayload) -> Result<String, HistoryError> {
        let mut index = self.load_index_or_reset()?;
        let entry = HistoryEntry::from_payload(self.next_timestamp(&index)?, payload);
        let id = entry.id.clone();

        let blob = serde_json::to_string(payload)?;
        self.store.set_item(&id, &blob)?;

        index.insert(0, entry);
        let capacity = self.settings.max_items.max(1);
        let evicted = if index.len() > capacity {
            index.split_off(capacity)
        } else {
            Vec::new()
        };

        if let Err(e) = self.save_index(&index) {
            if let Err(cleanup) = self.store.remove_item(&id) {
                warn!(id = %id, error = %cleanup, "failed to remove route after index write failed");
            }
            return Err(e);
        }

        if self.settings.purge_evicted_blobs {
            for old in &evicted {
                if let Err(e) = self.store.remove_item(&old.id) {
                    warn!(id = %old.id, error = %e, "failed to purge evicted route");
                }
            }
        }
        if !evicted.is_empty() {
            debug!(
                count = evicted.len(),
                purged = self.settings.purge_evicted_blobs,
                "evicted oldest history entries"
            );
        }

        Ok(id)
    }

    fn try_get(&self, id: &str) -> Result<Option<RoutePayload>, HistoryError> {
        match self.store.get_item(id)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn try_remove(&self, id: &str) -> Result<bool, HistoryError> {
        let mut index = self.load_index()?;
        let before = index.len();
        index.retain(|e| e.id != id);
        if index.len() == before {
            return Ok(false);
        }

        self.save_index(&index)?;
        if let Err(e) = self.store.remove_item(id) {
            warn!(id = %id, error = %e, "removed history entry but its route record remains");
        }
        Ok(true)
    }

    fn try_clear(&self) -> Result<(), HistoryError> {
        for entry in self.load_index_or_reset()? {
            self.store.remove_item(&entry.id)?;
        }
        self.store.remove_item(&self.settings.index_key)?;
        Ok(())
    }

    fn try_toggle_favorite(&self, id: &str) -> Result<bool, HistoryError> {
        let mut index = self.load_index()?;
        match index.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.is_favorite = !entry.is_favorite,
            None => return Ok(false),
        }
        self.save_index(&index)?;
        Ok(true)
    }

    fn try_prune_orphans(&self) -> Result<usize, HistoryError> {
        let index = self.load_index()?;
        let mut removed = 0;
        for key in self.store.keys()? {
            if is_route_id(&key) && !index.iter().any(|e| e.id == key) {
                self.store.remove_item(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<S: KeyValueStore> RouteHistoryTrait for RouteHistoryCache<S> {
    /// Records `payload` as the newest entry and returns its id, or `None`
    /// if it could not be stored.
    fn add(&mut self, payload: &RoutePayload) -> Option<String> {
        match self.try_add(payload) {
            Ok(id) => {
                debug!(id = %id, "route added to history");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "failed to add route to history");
                None
            }
        }
    }

    /// Lists entries newest first. Unreadable history lists as empty.
    fn list(&self) -> Vec<HistoryEntry> {
        self.load_index().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read history index");
            Vec::new()
        })
    }

    /// Returns the stored route for `id`, if present and readable.
    fn get(&self, id: &str) -> Option<RoutePayload> {
        self.try_get(id).unwrap_or_else(|e| {
            warn!(id = %id, error = %e, "failed to read route");
            None
        })
    }

    fn get_entry(&self, id: &str) -> Option<HistoryEntry> {
        self.list().into_iter().find(|e| e.id == id)
    }

    /// Removes `id` from the history. Returns false if it was not listed.
    fn remove(&mut self, id: &str) -> bool {
        self.try_remove(id).unwrap_or_else(|e| {
            warn!(id = %id, error = %e, "failed to remove history entry");
            false
        })
    }

    /// Deletes every listed route and the index itself. Stops at the first
    /// storage failure without restoring what was already deleted.
    fn clear(&mut self) -> bool {
        match self.try_clear() {
            Ok(()) => {
                debug!("history cleared");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to clear history");
                false
            }
        }
    }

    fn toggle_favorite(&mut self, id: &str) -> bool {
        self.try_toggle_favorite(id).unwrap_or_else(|e| {
            warn!(id = %id, error = %e, "failed to toggle favorite");
            false
        })
    }

    fn list_favorites(&self) -> Vec<HistoryEntry> {
        self.list().into_iter().filter(|e| e.is_favorite).collect()
    }

    /// Deletes route records that no index entry references and returns how
    /// many were removed.
    fn prune_orphans(&mut self) -> usize {
        match self.try_prune_orphans() {
            Ok(removed) => {
                if removed > 0 {
                    debug!(removed = removed, "pruned orphaned routes");
                }
                removed
            }
            Err(e) => {
                warn!(error = %e, "failed to prune orphaned routes");
                0
            }
        }
    }
}
