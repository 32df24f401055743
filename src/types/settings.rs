use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the history index.
pub const MAX_HISTORY_ITEMS: usize = 20;

/// Storage key of the history index.
pub const HISTORY_INDEX_KEY: &str = "route_history";

/// Tunables of the route history cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistorySettings {
    /// Capacity of the index; older entries are evicted beyond it.
    pub max_items: usize,
    /// Key under which the index is stored.
    pub index_key: String,
    /// Delete the route records of evicted entries. When false, eviction only
    /// truncates the index and leaves those records behind until
    /// `prune_orphans` runs.
    pub purge_evicted_blobs: bool,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_items: MAX_HISTORY_ITEMS,
            index_key: HISTORY_INDEX_KEY.to_string(),
            purge_evicted_blobs: true,
        }
    }
}
