//! Nested value normalization for text columns.
//!
//! Rules, applied recursively:
//! - object ids become their hex string,
//! - date/times become `YYYY-MM-DD HH:MM:SS`,
//! - maps keep key order and normalize their values,
//! - lists normalize their elements,
//! - other scalars pass through (non-finite floats become null).

use serde_json::{Map, Number, Value as Json};

use super::Value;

/// Fixed text format for date/time values inside JSON columns.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Empty container written when a nested field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyJson {
    /// `[]`
    List,
    /// `{}`
    Map,
}

/// Normalize a value into portable JSON.
pub fn normalize(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) | Value::ObjectId(s) => Json::String(s.clone()),
        Value::DateTime(dt) => Json::String(dt.format(DATETIME_FORMAT).to_string()),
        Value::List(items) => Json::Array(items.iter().map(normalize).collect()),
        Value::Map(doc) => {
            let mut map = Map::with_capacity(doc.len());
            for (k, v) in doc.iter() {
                map.insert(k.to_string(), normalize(v));
            }
            Json::Object(map)
        }
    }
}

/// Serialize an optional nested field as JSON text.
pub fn to_json_text(value: Option<&Value>, empty: EmptyJson) -> String {
    match value {
        Some(v) => normalize(v).to_string(),
        None => match empty {
            EmptyJson::List => "[]".to_string(),
            EmptyJson::Map => "{}".to_string(),
        },
    }
}
