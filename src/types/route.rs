use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A computed route as returned by the route-planning backend.
///
/// The payload is kept exactly as received: any JSON value is accepted and
/// stored unchanged, nulls and unexpected shapes included. The history only
/// looks into it to derive display strings, reading `route.label` and the
/// `risk_label` of the first and last entries of `locations` when they are
/// non-empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePayload(Value);

impl Default for RoutePayload {
    /// An empty object.
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl From<Value> for RoutePayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<RoutePayload> for Value {
    fn from(payload: RoutePayload) -> Self {
        payload.0
    }
}

impl RoutePayload {
    /// Convenience constructor for a labelled route through the given stops.
    pub fn new(label: &str, stops: &[&str]) -> Self {
        let locations: Vec<Value> = stops.iter().map(|s| json!({"risk_label": s})).collect();
        Self(json!({
            "route": {"label": label},
            "locations": locations,
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The route's label, if present and a non-empty string.
    pub fn label(&self) -> Option<&str> {
        non_empty_str(self.0.get("route")?.get("label")?)
    }

    /// Label of the first location.
    pub fn start_label(&self) -> Option<&str> {
        non_empty_str(self.locations()?.first()?.get("risk_label")?)
    }

    /// Label of the last location. A single-stop route starts and ends there.
    pub fn end_label(&self) -> Option<&str> {
        non_empty_str(self.locations()?.last()?.get("risk_label")?)
    }

    fn locations(&self) -> Option<&Vec<Value>> {
        self.0.get("locations")?.as_array()
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}
