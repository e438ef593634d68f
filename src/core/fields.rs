//! Structured field values for record `data` and `ctx`
//!
//! This module provides:
//! - `FieldValue`: loosely-typed value (null, bool, number, string, sequence,
//!   map, error)
//! - `Fields`: string-keyed map of values, optionally frozen

use super::error::{LoggerError, Result};
use super::error_value::{NormalizedError, RawError};
use std::collections::BTreeMap;

/// Rendered in place of an absent value inside sequences
pub const ABSENT_SENTINEL: &str = "undefined";

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A value the caller explicitly left missing
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<FieldValue>),
    Map(Fields),
    /// Already normalized error
    Error(NormalizedError),
    /// Native error awaiting normalization
    Native(RawError),
}

impl FieldValue {
    /// Capture a native error as a field value
    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FieldValue::Native(RawError::new(error))
    }

    /// `true` for native and normalized errors
    pub fn is_error_like(&self) -> bool {
        matches!(self, FieldValue::Error(_) | FieldValue::Native(_))
    }

    /// Normalized form of an error-like value
    pub fn normalized_error(&self) -> Option<NormalizedError> {
        match self {
            FieldValue::Error(err) => Some(err.clone()),
            FieldValue::Native(raw) => Some(raw.normalize()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            FieldValue::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Convert to a JSON value; `None` means the field should be omitted
    ///
    /// Non-finite floats have no JSON representation and are stringified.
    #[must_use]
    pub fn to_json_value(&self) -> Option<serde_json::Value> {
        use serde_json::Value;

        let value = match self {
            FieldValue::Absent => return None,
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => Value::Number(n),
                None => Value::String(f.to_string()),
            },
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| {
                        item.to_json_value()
                            .unwrap_or_else(|| Value::String(ABSENT_SENTINEL.to_string()))
                    })
                    .collect(),
            ),
            FieldValue::Map(fields) => Value::Object(fields.to_json_map()),
            FieldValue::Error(err) => err.to_json_value(),
            FieldValue::Native(raw) => raw.normalize().to_json_value(),
        };
        Some(value)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Float(i as f64))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Fields> for FieldValue {
    fn from(fields: Fields) -> Self {
        FieldValue::Map(fields)
    }
}

impl From<NormalizedError> for FieldValue {
    fn from(err: NormalizedError) -> Self {
        FieldValue::Error(err)
    }
}

impl From<RawError> for FieldValue {
    fn from(raw: RawError) -> Self {
        FieldValue::Native(raw)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Absent)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Int)
                .unwrap_or_else(|| FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))),
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => FieldValue::Map(map.into_iter().collect()),
        }
    }
}

/// String-keyed map of structured values
///
/// A frozen map rejects in-place mutation through [`Fields::insert`] and
/// [`Fields::remove`]; copies of a frozen map stay frozen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: BTreeMap<String, FieldValue>,
    frozen: bool,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field while building the map
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Mark the map read-only
    #[must_use]
    pub fn freeze(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Set a field in place
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Result<()>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        if self.frozen {
            return Err(LoggerError::frozen(key));
        }
        self.entries.insert(key, value.into());
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<FieldValue>> {
        if self.frozen {
            return Err(LoggerError::frozen(key));
        }
        Ok(self.entries.remove(key))
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    /// Mutable access to a nested value; assignment to `key` itself must go
    /// through [`Fields::insert`]
    pub(crate) fn value_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy entries of `other` that are not already present
    ///
    /// Existing entries take priority over merged ones.
    pub fn merge_missing(&mut self, other: &Fields) -> Result<()> {
        for (key, value) in other.iter() {
            if !self.entries.contains_key(key) {
                self.insert(key.clone(), value.clone())?;
            }
        }
        Ok(())
    }

    /// Render as a JSON object, omitting absent values
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.entries
            .iter()
            .filter_map(|(key, value)| value.to_json_value().map(|v| (key.clone(), v)))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            frozen: false,
        }
    }
}
