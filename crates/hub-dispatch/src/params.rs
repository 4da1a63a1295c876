//! Component parameters.
//!
//! Stored as a JSON object blob on the extension row and deserialized on
//! first access. Keys may be addressed with dotted paths (`feed.limit`).

use serde::Serialize;
use serde_json::{Map, Value};

/// Key-value parameters of a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params {
    data: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object blob. Empty, malformed or non-object blobs give
    /// empty params.
    pub fn from_blob(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::new();
        }
        match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(data)) => Self { data },
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "component params are not an object; ignoring");
                Self::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed component params; ignoring");
                Self::new()
            }
        }
    }

    /// Looks up a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.data.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        match self.get(path)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        match self.get(path)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Sets a dotted path, creating intermediate objects.
    pub fn set(&mut self, path: &str, value: Value) -> &mut Self {
        let parts: Vec<&str> = path.split('.').collect();
        set_path(&mut self.data, &parts, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.data.clone()).to_string()
    }
}

fn set_path(map: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                set_path(inner, rest, value);
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
