//! Frozen feature schema
//!
//! The schema is the ordered list of encoded column names a model was trained
//! on. Values in an encoded vector are aligned to it by position, so once a
//! schema is built it is never grown or reordered; there is no mutating API.
//!
//! Alongside the column list the schema remembers the reference level dropped
//! from each categorical block, which lets inference tell a reference level
//! (encoded as all zeros) apart from a level that was never seen.

use crate::error::{FeatureError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Name of the indicator column for `level` of categorical `column`.
pub fn indicator_name(column: &str, level: &str) -> String {
    format!("{}_{}", column, level)
}

fn has_block_prefix(encoded: &str, column: &str) -> bool {
    encoded
        .strip_prefix(column)
        .is_some_and(|rest| rest.starts_with('_'))
}

/// Ordered, immutable list of encoded feature columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    reference_levels: BTreeMap<String, String>,
    positions: HashMap<String, usize>,
}

/// On-disk form of a schema
#[derive(Serialize, Deserialize)]
struct SchemaRepr<'a> {
    columns: Cow<'a, [String]>,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    reference_levels: Cow<'a, BTreeMap<String, String>>,
}

fn is_empty_map(map: &Cow<'_, BTreeMap<String, String>>) -> bool {
    map.is_empty()
}

impl FeatureSchema {
    /// Build a schema from column names.
    ///
    /// # Errors
    /// Returns [`FeatureError::DuplicateColumn`] if a name occurs twice.
    pub fn from_columns(columns: Vec<String>) -> Result<Self> {
        Self::with_reference_levels(columns, BTreeMap::new())
    }

    /// Build a schema that also records the reference level of each
    /// categorical column.
    pub fn with_reference_levels(
        columns: Vec<String>,
        reference_levels: BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(FeatureError::DuplicateColumn(column.clone()));
            }
        }

        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Ok(Self {
            columns,
            reference_levels,
            positions,
        })
    }

    /// Number of encoded columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Whether the schema contains a column
    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Reference level dropped for a categorical column, if recorded
    pub fn reference_level(&self, column: &str) -> Option<&str> {
        self.reference_levels.get(column).map(String::as_str)
    }

    /// Positions of the indicator columns belonging to a categorical column
    ///
    /// An indicator named like two recorded categoricals (`Age_Group_Young`
    /// under `Age` and `Age_Group`) belongs to the longer name.
    pub fn indicator_positions(&self, column: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                has_block_prefix(c, column)
                    && self.block_owner(c).is_none_or(|owner| owner == column)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Longest recorded categorical whose indicator prefix `encoded` carries
    fn block_owner(&self, encoded: &str) -> Option<&str> {
        self.reference_levels
            .keys()
            .filter(|key| has_block_prefix(encoded, key))
            .max_by_key(|key| key.len())
            .map(String::as_str)
    }

    /// Iterate over column names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

impl Serialize for FeatureSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        SchemaRepr {
            columns: Cow::Borrowed(self.columns.as_slice()),
            reference_levels: Cow::Borrowed(&self.reference_levels),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = SchemaRepr::deserialize(deserializer)?;
        Self::with_reference_levels(repr.columns.into_owned(), repr.reference_levels.into_owned())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_positions_follow_order() {
        let schema =
            FeatureSchema::from_columns(names(&["Year", "Runtime", "Genre_Drama"])).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.position("Runtime"), Some(1));
        assert_eq!(schema.position("Genre_Drama"), Some(2));
        assert!(!schema.contains("Genre_Action"));
        assert_eq!(schema.indicator_positions("Genre"), vec![2]);
    }

    #[test]
    fn test_indicator_positions_respect_longer_blocks() {
        let mut refs = BTreeMap::new();
        refs.insert("Age".to_string(), "0-17".to_string());
        refs.insert("Age_Group".to_string(), "Young".to_string());
        let schema = FeatureSchema::with_reference_levels(
            names(&["Age_18-64", "Age_Group_Adult", "Age_Group_Senior", "Age_65+"]),
            refs,
        )
        .unwrap();

        assert_eq!(schema.indicator_positions("Age"), vec![0, 3]);
        assert_eq!(schema.indicator_positions("Age_Group"), vec![1, 2]);

        // a numeric column sharing the prefix owns no indicators
        let mut refs = BTreeMap::new();
        refs.insert("Age_Group".to_string(), "Young".to_string());
        let schema = FeatureSchema::with_reference_levels(
            names(&["Age", "Age_Group_Adult"]),
            refs,
        )
        .unwrap();
        assert!(schema.indicator_positions("Age").is_empty());
        assert_eq!(schema.indicator_positions("Age_Group"), vec![1]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = FeatureSchema::from_columns(names(&["a_b_c", "a_b_c"])).unwrap_err();
        assert_eq!(err, FeatureError::DuplicateColumn("a_b_c".to_string()));
    }

    #[test]
    fn test_serde_keeps_order_and_references() {
        let mut refs = BTreeMap::new();
        refs.insert("Platform".to_string(), "TV".to_string());
        let schema =
            FeatureSchema::with_reference_levels(names(&["TV", "Platform_Print"]), refs).unwrap();

        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(
            json,
            r#"{"columns":["TV","Platform_Print"],"reference_levels":{"Platform":"TV"}}"#
        );

        let back: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
        assert_eq!(back.position("Platform_Print"), Some(1));
        assert_eq!(back.reference_level("Platform"), Some("TV"));

        assert!(serde_json::from_str::<FeatureSchema>(r#"{"columns":["x","x"]}"#).is_err());
    }

    #[test]
    fn test_indicator_name() {
        assert_eq!(
            indicator_name("Platform", "Social Media"),
            "Platform_Social Media"
        );
    }
}
