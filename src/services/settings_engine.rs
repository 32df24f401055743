// Settings Engine
// Loads, saves, updates and resets the route history settings.
// Settings are stored as a JSON file, by default next to the database.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::errors::SettingsError;
use crate::types::history::is_route_id;
use crate::types::settings::HistorySettings;

/// Environment variable overriding the settings file path.
pub const CONFIG_PATH_ENV: &str = "ROUTE_HISTORY_CONFIG";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ROUTE_HISTORY_DATA_DIR";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<HistorySettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &HistorySettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Directory holding the database and settings: `$ROUTE_HISTORY_DATA_DIR`,
/// else the executable's directory, else the working directory.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Rejects settings the cache cannot honor.
pub fn validate(settings: &HistorySettings) -> Result<(), SettingsError> {
    if settings.max_items == 0 {
        return Err(SettingsError::InvalidValue(
            "max_items must be at least 1".to_string(),
        ));
    }
    if settings.index_key.is_empty() {
        return Err(SettingsError::InvalidValue(
            "index_key cannot be empty".to_string(),
        ));
    }
    // The index must not be mistaken for a route record.
    if is_route_id(&settings.index_key) {
        return Err(SettingsError::InvalidValue(format!(
            "index_key '{}' collides with route ids",
            settings.index_key
        )));
    }
    Ok(())
}

/// Settings engine that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: HistorySettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise uses `$ROUTE_HISTORY_CONFIG`, falling back to
    /// `route_history.json` in [`data_dir`].
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| {
                data_dir()
                    .join("route_history.json")
                    .to_string_lossy()
                    .to_string()
            });

        Self {
            config_path,
            settings: HistorySettings::default(),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields the defaults. Keys absent from the file take
    /// their default values.
    fn load(&mut self) -> Result<HistorySettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = HistorySettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("Failed to read config file: {}", e)))?;

        let settings: HistorySettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::Serialization(format!("Failed to parse config file: {}", e))
        })?;
        validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::Serialization(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::Io(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &HistorySettings {
        &self.settings
    }

    /// Updates one setting by name and saves to disk.
    ///
    /// The new value goes through a serde round-trip and [`validate`], so a
    /// wrong type or an out-of-range value leaves the settings unchanged.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::Serialization(format!("Failed to serialize settings: {}", e))
        })?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )));
            }
        }

        let new_settings: HistorySettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&new_settings)?;

        self.settings = new_settings;
        self.save()?;

        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = HistorySettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
