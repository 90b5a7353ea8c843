//! Values accepted by the dispatching write path and returned by the
//! generic read path.

use crate::entity::HashEntity;
use crate::error::{Error, Result};
use crate::field::FieldValue;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// A value routed to the scalar or the hash path on write.
///
/// Scalars (`Text`, `Integer`, `Float`) land in the key's plain string slot;
/// `Fields` (built from a mapping or an entity) land in a hash.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Fields(Vec<(String, FieldValue)>),
}

impl CacheValue {
    /// Field-extract an entity for the hash path.
    pub fn from_entity<T: HashEntity>(entity: &T) -> Self {
        CacheValue::Fields(
            entity
                .to_fields()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    /// Build from a mapping of field names to values.
    pub fn from_map<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        CacheValue::Fields(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// String written to the scalar slot, or `None` for hash-path values.
    pub(crate) fn scalar_string(&self) -> Option<String> {
        match self {
            CacheValue::Text(s) => Some(s.clone()),
            CacheValue::Integer(n) => Some(n.to_string()),
            CacheValue::Float(x) => Some(x.to_string()),
            CacheValue::Fields(_) => None,
        }
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        CacheValue::Text(s.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        CacheValue::Text(s)
    }
}

impl From<i64> for CacheValue {
    fn from(n: i64) -> Self {
        CacheValue::Integer(n)
    }
}

impl From<i32> for CacheValue {
    fn from(n: i32) -> Self {
        CacheValue::Integer(i64::from(n))
    }
}

impl From<f64> for CacheValue {
    fn from(x: f64) -> Self {
        CacheValue::Float(x)
    }
}

impl From<HashMap<String, FieldValue>> for CacheValue {
    fn from(map: HashMap<String, FieldValue>) -> Self {
        CacheValue::Fields(map.into_iter().collect())
    }
}

/// Dynamic dispatch for JSON input.
///
/// Strings and numbers become scalars, objects become hash fields. Arrays
/// and booleans have no storage mapping and fail with
/// `Error::UnsupportedValue`; `null` also fails here and is treated as a
/// no-op by `FieldCache::set_json` before conversion.
impl TryFrom<&Value> for CacheValue {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(CacheValue::Text(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(CacheValue::Integer(i)),
                None if n.is_f64() => n.as_f64().map(CacheValue::Float).ok_or_else(|| {
                    Error::UnsupportedValue(format!("number out of range: {}", n))
                }),
                // integers past i64 keep their exact digits
                None => Ok(CacheValue::Text(n.to_string())),
            },
            Value::Object(map) => Ok(CacheValue::Fields(
                map.iter()
                    .map(|(name, v)| (name.clone(), json_field(v)))
                    .collect(),
            )),
            Value::Array(_) => Err(Error::UnsupportedValue("array".to_string())),
            Value::Bool(_) => Err(Error::UnsupportedValue("boolean".to_string())),
            Value::Null => Err(Error::UnsupportedValue("null".to_string())),
        }
    }
}

fn json_field(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None if n.is_f64() => n
                .as_f64()
                .map(FieldValue::Float)
                .unwrap_or_else(|| FieldValue::Text(n.to_string())),
            None => FieldValue::Text(n.to_string()),
        },
        // nested structures keep their JSON text
        Value::Array(_) | Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}

/// What the generic read path found at a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredValue {
    Text(String),
    Hash(HashMap<String, String>),
}

impl StoredValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoredValue::Text(s) => Some(s),
            StoredValue::Hash(_) => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashMap<String, String>> {
        match self {
            StoredValue::Hash(fields) => Some(fields),
            StoredValue::Text(_) => None,
        }
    }
}

/// Primitive types stored in the scalar slot.
pub trait Scalar: Display + FromStr + Send {
    /// Parse a stored string.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseError` when `raw` is not well-formed.
    fn parse_stored(raw: &str) -> Result<Self> {
        raw.parse().map_err(|_| {
            Error::ParseError(format!(
                "'{}' is not a valid {}",
                raw,
                std::any::type_name::<Self>()
            ))
        })
    }
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {
        $(impl Scalar for $t {})*
    };
}

impl_scalar!(i32, i64, u32, u64, f32, f64, String);
