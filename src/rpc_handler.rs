//! RPC method handler for the route history JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a method call to the history cache or the
//! settings engine held by the `App`.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::route_history::RouteHistoryTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::route::RoutePayload;

fn require_id(params: &Value) -> Result<&str, String> {
    params
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing id".to_string())
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── History ───
        "history.add" => {
            let route = params.get("route").ok_or("missing route")?;
            let payload = RoutePayload::from(route.clone());
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let id = a.history.add(&payload).ok_or("failed to save route")?;
            Ok(json!({"id": id}))
        }
        "history.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"items": a.history.list()}))
        }
        "history.favorites" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"items": a.history.list_favorites()}))
        }
        "history.get" => {
            let id = require_id(params)?;
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!(a.history.get(id)))
        }
        "history.entry" => {
            let id = require_id(params)?;
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!(a.history.get_entry(id)))
        }
        "history.remove" => {
            let id = require_id(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"removed": a.history.remove(id)}))
        }
        "history.toggle_favorite" => {
            let id = require_id(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"ok": a.history.toggle_favorite(id)}))
        }
        "history.clear" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"ok": a.history.clear()}))
        }
        "history.prune" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"removed": a.history.prune_orphans()}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.set_setting(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
