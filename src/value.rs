//! Canonical representation of context values.
//!
//! # Responsibilities
//! - Define the value type carried by context layers and record extras
//! - Convert arbitrary values into a stable JSON form
//! - Provide a deterministic single-line repr for plaintext output
//!
//! # Design Decisions
//! - Timestamps render as ISO-8601 strings
//! - Complex numbers render as `{"real": r, "imag": i}`
//! - Unrepresentable values degrade to a string, never to an error
//! - `serde_json` is built without `preserve_order`, so object keys are
//!   sorted and the plaintext repr is diffable

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// A value bound in a log context or passed as a record extra.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// Date/time-like value, rendered as ISO-8601.
    Timestamp(DateTime<Utc>),
    /// Paired-number value with named components.
    Complex { real: f64, imag: f64 },
    Array(Vec<ContextValue>),
    Map(BTreeMap<String, ContextValue>),
    /// Pre-serialized JSON, passed through as-is.
    Json(Value),
}

impl ContextValue {
    /// Convert any serializable value, falling back to a placeholder string
    /// when serialization fails. Never errors and never drops the field.
    pub fn from_serialize<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => ContextValue::Json(v),
            Err(e) => ContextValue::String(format!("<unserializable: {}>", e)),
        }
    }

    /// Capture the display form of a value that has no structured
    /// representation.
    pub fn from_display<T: fmt::Display>(value: T) -> Self {
        ContextValue::String(value.to_string())
    }

    /// Render as a bare string: strings come out unquoted, everything else
    /// uses the canonical JSON repr. Used where the value crosses a text
    /// boundary such as an HTTP header.
    pub fn to_plain_string(&self) -> String {
        match self {
            ContextValue::String(s) => s.clone(),
            other => plain_repr(other),
        }
    }
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        ContextValue::Bool(v)
    }
}

impl From<i32> for ContextValue {
    fn from(v: i32) -> Self {
        ContextValue::Int(v as i64)
    }
}

impl From<i64> for ContextValue {
    fn from(v: i64) -> Self {
        ContextValue::Int(v)
    }
}

impl From<u32> for ContextValue {
    fn from(v: u32) -> Self {
        ContextValue::Uint(v as u64)
    }
}

impl From<u64> for ContextValue {
    fn from(v: u64) -> Self {
        ContextValue::Uint(v)
    }
}

impl From<f64> for ContextValue {
    fn from(v: f64) -> Self {
        ContextValue::Float(v)
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        ContextValue::String(v.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        ContextValue::String(v)
    }
}

impl From<DateTime<Utc>> for ContextValue {
    fn from(v: DateTime<Utc>) -> Self {
        ContextValue::Timestamp(v)
    }
}

impl From<Value> for ContextValue {
    fn from(v: Value) -> Self {
        ContextValue::Json(v)
    }
}

impl<T: Into<ContextValue>> From<Vec<T>> for ContextValue {
    fn from(v: Vec<T>) -> Self {
        ContextValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ContextValue>> From<BTreeMap<String, T>> for ContextValue {
    fn from(v: BTreeMap<String, T>) -> Self {
        ContextValue::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Convert a context value into its canonical JSON form.
///
/// Applied recursively through arrays and maps. Non-finite floats cannot be
/// carried by JSON numbers and degrade to their display string.
pub fn canonicalize(value: &ContextValue) -> Value {
    match value {
        ContextValue::Null => Value::Null,
        ContextValue::Bool(b) => Value::Bool(*b),
        ContextValue::Int(i) => Value::from(*i),
        ContextValue::Uint(u) => Value::from(*u),
        ContextValue::Float(f) => canonical_float(*f),
        ContextValue::String(s) => Value::String(s.clone()),
        ContextValue::Timestamp(ts) => {
            Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
        }
        ContextValue::Complex { real, imag } => {
            let mut map = serde_json::Map::new();
            map.insert("real".to_owned(), canonical_float(*real));
            map.insert("imag".to_owned(), canonical_float(*imag));
            Value::Object(map)
        }
        ContextValue::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        ContextValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect(),
        ),
        ContextValue::Json(v) => v.clone(),
    }
}

/// Render a context value as a single deterministic line of JSON text.
///
/// Object keys come out sorted, so repeated runs produce identical output.
pub fn plain_repr(value: &ContextValue) -> String {
    canonicalize(value).to_string()
}

fn canonical_float(f: f64) -> Value {
    match serde_json::Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None => Value::String(format!("{}", f)),
    }
}
