use serde::{Deserialize, Serialize};

use super::route::RoutePayload;

/// Display name used when a route carries no label.
pub const FALLBACK_NAME: &str = "Itinéraire sans nom";
/// Display start used when a route has no first location label.
pub const FALLBACK_START: &str = "Départ inconnu";
/// Display end used when a route has no last location label.
pub const FALLBACK_END: &str = "Arrivée inconnue";

/// Prefix of every history entry id; the rest is the creation timestamp.
pub const ROUTE_ID_PREFIX: &str = "route_";

/// Lightweight summary of a stored route, kept in the history index.
///
/// Field names are persisted in camelCase so the stored index stays
/// readable by the web client sharing the same storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: i64,
    pub name: String,
    pub start_location: String,
    pub end_location: String,
    #[serde(default)]
    pub is_favorite: bool,
}

impl HistoryEntry {
    /// Builds a non-favorite entry for `payload`, deriving its display
    /// strings and falling back to fixed literals where the payload is silent.
    pub fn from_payload(timestamp: i64, payload: &RoutePayload) -> Self {
        Self {
            id: route_id(timestamp),
            timestamp,
            name: payload.label().unwrap_or(FALLBACK_NAME).to_string(),
            start_location: payload.start_label().unwrap_or(FALLBACK_START).to_string(),
            end_location: payload.end_label().unwrap_or(FALLBACK_END).to_string(),
            is_favorite: false,
        }
    }
}

/// Formats the id of the entry created at `timestamp`.
pub fn route_id(timestamp: i64) -> String {
    format!("{}{}", ROUTE_ID_PREFIX, timestamp)
}

/// Returns true if `key` has the shape of a route id (`route_` + digits).
pub fn is_route_id(key: &str) -> bool {
    match key.strip_prefix(ROUTE_ID_PREFIX) {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
