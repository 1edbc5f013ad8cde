//! Loosely-typed source documents.
//!
//! A [`Document`] is an ordered list of fields holding [`Value`]s. Migrators
//! never inspect raw values directly; they go through the typed accessors here,
//! which apply the defaulting rules of the destination columns:
//!
//! - a field that is absent takes the column default,
//! - a field that is present but null stays NULL,
//! - references are followed only when the value is truthy.

mod normalize;

pub use normalize::{normalize, to_json_text, EmptyJson, DATETIME_FORMAT};

use chrono::{Local, NaiveDateTime};

use crate::error::{DocError, DocResult};
use crate::target::SqlValue;

/// Field holding the original document identifier.
pub const ID_FIELD: &str = "_id";

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Opaque original identifier, as a hex string.
    ObjectId(String),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Map(Document),
}

impl Value {
    /// Construct an object-id value.
    pub fn oid(hex: impl Into<String>) -> Self {
        Value::ObjectId(hex.into())
    }

    /// Truthiness as the source application understood it: null, false,
    /// zero and empty containers are all "not set".
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::ObjectId(_) | Value::DateTime(_) => true,
            Value::List(items) => !items.is_empty(),
            Value::Map(doc) => !doc.is_empty(),
        }
    }

    /// Plain text form. Identifiers render as their hex string; containers
    /// render as normalized JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) | Value::ObjectId(s) => s.clone(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Value::List(_) | Value::Map(_) => normalize(self).to_string(),
        }
    }

    /// Numeric view of the value. Numeric strings are accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert to a column value. Containers become JSON text.
    pub fn to_sql(&self) -> SqlValue {
        match self {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Int(i) => SqlValue::I64(*i),
            Value::Float(f) => SqlValue::F64(*f),
            Value::String(s) | Value::ObjectId(s) => SqlValue::Text(s.clone()),
            Value::DateTime(dt) => SqlValue::DateTime(*dt),
            Value::List(_) | Value::Map(_) => SqlValue::Text(normalize(self).to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// An ordered, immutable-once-read source record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field append.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field, replacing an earlier value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The original identifier as a string.
    pub fn oid(&self) -> DocResult<String> {
        match self.get(ID_FIELD) {
            None | Some(Value::Null) => Err(DocError::MissingId),
            Some(v) => Ok(v.to_text()),
        }
    }

    /// Identifying text for log lines, `unknown` when the field is absent.
    pub fn label(&self, key: &str) -> String {
        self.get(key)
            .map(Value::to_text)
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Column value, or NULL when absent.
    pub fn field(&self, key: &str) -> SqlValue {
        self.get(key).map_or(SqlValue::Null, Value::to_sql)
    }

    /// Column value, or `default` when absent.
    pub fn field_or(&self, key: &str, default: impl Into<SqlValue>) -> SqlValue {
        match self.get(key) {
            Some(v) => v.to_sql(),
            None => default.into(),
        }
    }

    /// Timestamp column, "now" when absent.
    pub fn timestamp_or_now(&self, key: &str) -> SqlValue {
        match self.get(key) {
            Some(v) => v.to_sql(),
            None => SqlValue::DateTime(now()),
        }
    }

    /// Nested field serialized as normalized JSON text, or the empty
    /// container when absent.
    pub fn json_or(&self, key: &str, empty: EmptyJson) -> SqlValue {
        SqlValue::Text(to_json_text(self.get(key), empty))
    }

    /// Original id of a referenced document, when the field is truthy.
    pub fn reference(&self, key: &str) -> Option<String> {
        self.get(key)
            .filter(|v| v.is_truthy())
            .map(Value::to_text)
    }

    /// Original ids listed in a many-to-many field.
    pub fn references(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::List(items)) => items
                .iter()
                .filter(|v| !matches!(v, Value::Null | Value::List(_) | Value::Map(_)))
                .map(Value::to_text)
                .collect(),
            Some(v) if v.is_truthy() => vec![v.to_text()],
            _ => Vec::new(),
        }
    }

    /// Text field; `None` when absent, error when present but not text.
    pub fn text(&self, key: &str) -> DocResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(DocError::invalid(
                key,
                format!("expected text, found {}", other.to_text()),
            )),
        }
    }
}

/// Local wall-clock time, the value timestamp columns default to.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
