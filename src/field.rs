//! Field values and the typed parser table used on the hash path.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone};
use std::fmt;

/// Declared storage kind of an entity field.
///
/// Selects the parser applied to the stored string when a hash is read back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// Epoch milliseconds. Read back as an integer, never as a date.
    Timestamp,
}

impl FieldKind {
    /// Parse a stored hash field according to this kind.
    ///
    /// An empty string for a `Timestamp` yields `FieldValue::Null`.
    ///
    /// # Errors
    ///
    /// Returns `Error::FieldError` when `raw` is not well-formed for the kind.
    pub fn parse(self, name: &str, raw: &str) -> Result<FieldValue> {
        match self {
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| Error::field(name, format!("'{}' is not an integer: {}", raw, e))),
            FieldKind::Float => raw
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|e| Error::field(name, format!("'{}' is not a float: {}", raw, e))),
            FieldKind::Boolean => raw
                .parse::<bool>()
                .map(FieldValue::Bool)
                .map_err(|e| Error::field(name, format!("'{}' is not a boolean: {}", raw, e))),
            FieldKind::Timestamp if raw.is_empty() => Ok(FieldValue::Null),
            FieldKind::Timestamp => raw.parse::<i64>().map(FieldValue::Timestamp).map_err(|e| {
                Error::field(name, format!("'{}' is not an epoch timestamp: {}", raw, e))
            }),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single field value on its way into or out of a hash.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Absent value. Never written.
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Epoch milliseconds.
    Timestamp(i64),
}

impl FieldValue {
    /// String form stored in the hash, or `None` for `Null`.
    pub fn encode(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) | FieldValue::Timestamp(n) => Some(n.to_string()),
            FieldValue::Float(x) => Some(x.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; timestamps yield their epoch milliseconds.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) | FieldValue::Timestamp(n) => Some(*n),
            _ => None,
        }
    }

    /// Float view; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(x) => Some(*x),
            FieldValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Timestamp(_) => "timestamp",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<f32> for FieldValue {
    fn from(x: f32) -> Self {
        FieldValue::Float(f64::from(x))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FieldValue {
    fn from(dt: DateTime<Tz>) -> Self {
        FieldValue::Timestamp(dt.timestamp_millis())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}
