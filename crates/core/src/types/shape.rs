//! Declarative extractors for inconsistently shaped JSON payloads.
//!
//! The backend returns the same concept under different field names depending
//! on the route (`[...]`, `{ "data": [...] }`, `{ "returns": [...] }`, ...).
//! Callers describe the shapes they accept as an ordered slice of [`Shape`]s
//! and take the first one that yields something meaningful.

use serde_json::Value;

/// Where to look for a value inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The payload itself.
    Root,
    /// A top-level field.
    Field(&'static str),
    /// A nested field path, outermost first.
    Path(&'static [&'static str]),
}

impl Shape {
    /// Select the value this shape points at, if it exists.
    #[must_use]
    pub fn select<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match self {
            Self::Root => Some(value),
            Self::Field(name) => value.get(name),
            Self::Path(names) => names.iter().try_fold(value, |v, name| v.get(name)),
        }
    }
}

/// Whether a value carries data: not `null`, `""`, `[]` or `{}`.
#[must_use]
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Return the first present value selected by `shapes`.
#[must_use]
pub fn extract<'a>(value: &'a Value, shapes: &[Shape]) -> Option<&'a Value> {
    shapes
        .iter()
        .filter_map(|shape| shape.select(value))
        .find(|v| is_present(v))
}

/// Return the first non-empty string selected by `shapes`.
///
/// Numbers are accepted and rendered, since ids arrive as either.
#[must_use]
pub fn extract_string(value: &Value, shapes: &[Shape]) -> Option<String> {
    shapes
        .iter()
        .filter_map(|shape| shape.select(value))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Return the first non-empty array selected by `shapes`, or an empty list.
#[must_use]
pub fn extract_list(value: &Value, shapes: &[Shape]) -> Vec<Value> {
    shapes
        .iter()
        .filter_map(|shape| shape.select(value))
        .find_map(|v| match v {
            Value::Array(items) if !items.is_empty() => Some(items.clone()),
            _ => None,
        })
        .unwrap_or_default()
}
