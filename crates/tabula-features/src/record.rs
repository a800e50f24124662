//! Raw input records
//!
//! A [`RawRecord`] is one unordered row as supplied by a caller: a mapping from
//! field name to a [`RawValue`]. Nothing about a record is trusted; numeric
//! fields are parsed on access and categorical fields are rendered to their
//! level string.

use crate::error::{FeatureError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single raw cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Numeric scalar
    Number(f64),
    /// Text value, either a category or a number still in string form
    Text(String),
}

impl RawValue {
    /// Interpret the value as a finite number.
    ///
    /// Text is trimmed and parsed, so `" 5.1 "` is accepted.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Render the value as a categorical level.
    pub fn as_level(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One unordered input row keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    /// Create an empty record
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or overwrite a field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field if present
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }

    /// Whether the record carries a field
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Get a field, failing with [`FeatureError::MissingField`] if absent.
    pub fn require(&self, field: &str) -> Result<&RawValue> {
        self.fields.get(field).ok_or_else(|| FeatureError::MissingField {
            field: field.to_string(),
        })
    }

    /// Get a required field as a finite number.
    pub fn number(&self, field: &str) -> Result<f64> {
        let value = self.require(field)?;
        value.as_number().ok_or_else(|| FeatureError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// Get a required field as a categorical level.
    pub fn level(&self, field: &str) -> Result<String> {
        Ok(self.require(field)?.as_level())
    }

    /// Iterate over fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
