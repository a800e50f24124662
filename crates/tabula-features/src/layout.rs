//! Declared raw columns of a predictor.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// How a raw column is fed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Passed through (and later standardized)
    #[display("numeric")]
    Numeric,
    /// Expanded into one-hot indicator columns
    #[display("categorical")]
    Categorical,
}

/// A single declared raw column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field name in raw records
    pub name: String,
    /// Column kind
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Declare a numeric column
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
        }
    }

    /// Declare a categorical column
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
        }
    }
}

/// Ordered set of raw columns a predictor consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    columns: Vec<ColumnSpec>,
}

impl TableLayout {
    /// Create a layout from columns in declaration order
    pub const fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// All columns in declaration order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Names of numeric columns in declaration order
    pub fn numeric(&self) -> impl Iterator<Item = &str> {
        self.of_kind(ColumnKind::Numeric)
    }

    /// Names of categorical columns in declaration order
    pub fn categorical(&self) -> impl Iterator<Item = &str> {
        self.of_kind(ColumnKind::Categorical)
    }

    /// Look up the kind of a column
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Number of declared columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the layout declares no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| c.name.as_str())
    }
}

impl FromIterator<ColumnSpec> for TableLayout {
    fn from_iter<I: IntoIterator<Item = ColumnSpec>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_partitions_keep_order() {
        let layout: TableLayout = [
            ColumnSpec::numeric("TV"),
            ColumnSpec::categorical("AgeGroup"),
            ColumnSpec::numeric("Radio"),
            ColumnSpec::categorical("Platform"),
        ]
        .into_iter()
        .collect();

        assert_eq!(layout.numeric().collect::<Vec<_>>(), ["TV", "Radio"]);
        assert_eq!(
            layout.categorical().collect::<Vec<_>>(),
            ["AgeGroup", "Platform"]
        );
        assert_eq!(layout.kind("Radio"), Some(ColumnKind::Numeric));
        assert_eq!(layout.kind("Missing"), None);
        assert_eq!(ColumnKind::Categorical.to_string(), "categorical");
    }
}
