//! App Core.
//!
//! Holds the settings engine and the route history cache opened on the
//! SQLite store, and keeps the cache's settings in step with the engine.

use tracing::{info, warn};

use crate::managers::route_history::RouteHistoryCache;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::storage::SqliteStore;
use crate::types::errors::SettingsError;

/// Central application struct.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub history: RouteHistoryCache<SqliteStore>,
}

impl App {
    /// Opens the database at `db_path` with settings from the default
    /// config location.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(db_path, None)
    }

    /// Opens the database at `db_path` with settings from `config_path`.
    ///
    /// Unreadable or invalid settings fall back to the defaults.
    pub fn with_config(
        db_path: &str,
        config_path: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let store = SqliteStore::open(db_path)?;

        let mut settings_engine = SettingsEngine::new(config_path);
        let settings = settings_engine.load().unwrap_or_else(|e| {
            warn!(path = %settings_engine.get_config_path(), error = %e, "using default settings");
            Default::default()
        });

        info!(db = %db_path, max_items = settings.max_items, "route history opened");

        Ok(Self {
            settings_engine,
            history: RouteHistoryCache::with_settings(store, settings),
        })
    }

    /// Updates one setting, persists it, and applies it to the cache.
    ///
    /// `index_key` is fixed while the history is open: switching it would
    /// leave the current index behind and let `prune_orphans` delete every
    /// route it lists.
    pub fn set_setting(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key == "index_key" {
            return Err(SettingsError::InvalidKey(
                "index_key cannot change while the history is open".to_string(),
            ));
        }
        self.settings_engine.set_value(key, value)?;
        self.history
            .set_settings(self.settings_engine.get_settings().clone());
        Ok(())
    }
}
