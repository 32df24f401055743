use thiserror::Error;

// === StorageError ===

/// Errors reported by a key-value store adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing the value would exceed the store's capacity.
    #[error("Storage quota exceeded writing '{key}': needs {needed} bytes, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
    /// The store cannot be reached (locked, poisoned, closed).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    /// The underlying backend rejected the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

// === HistoryError ===

/// Errors raised inside the route history cache before they are mapped to
/// the degraded return values of its public operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The key-value store failed.
    #[error("History storage error: {0}")]
    Storage(#[from] StorageError),
    /// A persisted record could not be encoded or decoded.
    #[error("History serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// No timestamp after the newest indexed entry fits in an `i64`.
    #[error("History timestamp overflow after {0}")]
    TimestampOverflow(i64),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    Io(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    Serialization(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
