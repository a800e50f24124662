//! Categorical Encoder
//!
//! One-hot expansion of categorical columns with a dropped reference level.
//!
//! Training (`fit_transform`) derives the encoded column set from the data:
//! numeric columns first in declaration order, then one indicator block per
//! categorical column. Each block holds `{column}_{level}` for every level in
//! first-seen order except the first, which is the reference level and is
//! represented by all-zero indicators.
//!
//! Inference (`transform_one`) never derives anything. The single record is
//! expanded the same way, then every cell is placed by its position in the
//! frozen [`FeatureSchema`]. Schema columns the record did not produce stay 0;
//! cells the schema does not know are dropped or rejected according to the
//! [`UnseenCategoryPolicy`].

use crate::error::{FeatureError, Result};
use crate::layout::TableLayout;
use crate::record::RawRecord;
use crate::schema::{FeatureSchema, indicator_name};
use ndarray::{Array1, Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// What to do with a categorical level that has no schema column and is not
/// the reference level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenCategoryPolicy {
    /// Encode as all zeros, same as the reference level
    #[default]
    Ignore,
    /// Fail with [`FeatureError::UnseenCategory`]
    Reject,
}

/// Encoder configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Handling of levels never seen during training (default: ignore)
    #[serde(default)]
    pub unseen: UnseenCategoryPolicy,
}

/// One expanded cell before alignment to the schema
#[derive(Debug)]
struct Cell {
    name: String,
    value: f64,
    /// `(column, level)` for indicator cells
    origin: Option<(String, String)>,
}

/// One-hot encoder bound to a table layout
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    layout: TableLayout,
    config: EncoderConfig,
}

impl CategoricalEncoder {
    /// Create an encoder for a layout
    pub const fn new(layout: TableLayout, config: EncoderConfig) -> Self {
        Self { layout, config }
    }

    /// The layout this encoder expands
    pub const fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// The encoder configuration
    pub const fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Fit the one-hot expansion on training records and encode them.
    ///
    /// Missing numeric cells are filled with the median of the present values
    /// of that column. Categorical cells are required.
    ///
    /// # Returns
    /// * The encoded matrix (rows x schema width) and the frozen schema
    pub fn fit_transform(&self, records: &[RawRecord]) -> Result<(Array2<f64>, FeatureSchema)> {
        if records.is_empty() {
            return Err(FeatureError::EmptyTable);
        }

        let medians = self.numeric_medians(records)?;

        let mut columns: Vec<String> = self.layout.numeric().map(str::to_string).collect();
        let mut reference_levels = BTreeMap::new();
        for column in self.layout.categorical() {
            let mut levels = first_seen_levels(records, column)?.into_iter();
            if let Some(reference) = levels.next() {
                reference_levels.insert(column.to_string(), reference);
            }
            columns.extend(levels.map(|level| indicator_name(column, &level)));
        }

        let schema = FeatureSchema::with_reference_levels(columns, reference_levels)?;

        let mut matrix = Array2::<f64>::zeros((records.len(), schema.len()));
        for (record, row) in records.iter().zip(matrix.rows_mut()) {
            let cells = self.expand(record, Some(&medians))?;
            align(cells, &schema, row, UnseenCategoryPolicy::Reject)?;
        }

        tracing::info!(
            rows = records.len(),
            features = schema.len(),
            "fitted one-hot encoding"
        );

        Ok((matrix, schema))
    }

    /// Encode a single record against a frozen schema.
    ///
    /// The result always has exactly `schema.len()` entries.
    pub fn transform_one(&self, record: &RawRecord, schema: &FeatureSchema) -> Result<Array1<f64>> {
        let mut vector = Array1::<f64>::zeros(schema.len());
        let cells = self.expand(record, None)?;
        align(cells, schema, vector.view_mut(), self.config.unseen)?;
        Ok(vector)
    }

    /// Encode several records against a frozen schema.
    pub fn transform(&self, records: &[RawRecord], schema: &FeatureSchema) -> Result<Array2<f64>> {
        let mut matrix = Array2::<f64>::zeros((records.len(), schema.len()));
        for (record, row) in records.iter().zip(matrix.rows_mut()) {
            let cells = self.expand(record, None)?;
            align(cells, schema, row, self.config.unseen)?;
        }
        Ok(matrix)
    }

    /// Local one-hot expansion of one record.
    ///
    /// With `fallback` set, absent numeric fields take the fallback value
    /// instead of failing.
    fn expand(
        &self,
        record: &RawRecord,
        fallback: Option<&HashMap<String, f64>>,
    ) -> Result<Vec<Cell>> {
        let mut cells = Vec::with_capacity(self.layout.len());

        for column in self.layout.numeric() {
            let imputed = match fallback {
                Some(medians) if !record.contains(column) => medians.get(column).copied(),
                _ => None,
            };
            let value = match imputed {
                Some(v) => v,
                None => record.number(column)?,
            };
            cells.push(Cell {
                name: column.to_string(),
                value,
                origin: None,
            });
        }

        for column in self.layout.categorical() {
            let level = record.level(column)?;
            cells.push(Cell {
                name: indicator_name(column, &level),
                value: 1.0,
                origin: Some((column.to_string(), level)),
            });
        }

        Ok(cells)
    }

    fn numeric_medians(&self, records: &[RawRecord]) -> Result<HashMap<String, f64>> {
        let mut medians = HashMap::new();

        for column in self.layout.numeric() {
            let mut values = Vec::with_capacity(records.len());
            for record in records.iter().filter(|r| r.contains(column)) {
                values.push(record.number(column)?);
            }

            let missing = records.len() - values.len();
            let Some(median) = median(&mut values) else {
                return Err(FeatureError::EmptyColumn(column.to_string()));
            };
            if missing > 0 {
                tracing::warn!(column, missing, median, "imputing missing numeric cells");
            }
            medians.insert(column.to_string(), median);
        }

        Ok(medians)
    }
}

/// Place expanded cells by schema position.
fn align(
    cells: Vec<Cell>,
    schema: &FeatureSchema,
    mut row: ArrayViewMut1<'_, f64>,
    policy: UnseenCategoryPolicy,
) -> Result<()> {
    if row.len() != schema.len() {
        return Err(FeatureError::DimensionMismatch {
            expected: schema.len(),
            actual: row.len(),
        });
    }

    for cell in cells {
        if let Some(pos) = schema.position(&cell.name) {
            row[pos] = cell.value;
            continue;
        }

        let Some((column, level)) = cell.origin else {
            return Err(FeatureError::UnknownColumn(cell.name));
        };
        if schema.reference_level(&column) == Some(level.as_str()) {
            continue;
        }

        match policy {
            UnseenCategoryPolicy::Ignore => {
                tracing::debug!(%column, %level, "dropping indicator for unseen level");
            }
            UnseenCategoryPolicy::Reject => {
                return Err(FeatureError::UnseenCategory { column, level });
            }
        }
    }

    Ok(())
}

/// Distinct levels of a categorical column in first-seen order.
fn first_seen_levels(records: &[RawRecord], column: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut levels = Vec::new();
    for record in records {
        let level = record.level(column)?;
        if seen.insert(level.clone()) {
            levels.push(level);
        }
    }
    Ok(levels)
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ColumnSpec;
    use rstest::rstest;

    fn movie_layout() -> TableLayout {
        TableLayout::new(vec![
            ColumnSpec::categorical("Genre"),
            ColumnSpec::categorical("Director"),
            ColumnSpec::numeric("Year"),
            ColumnSpec::numeric("Runtime"),
        ])
    }

    fn movie(genre: &str, director: &str, year: i64, runtime: i64) -> RawRecord {
        RawRecord::new()
            .with("Genre", genre)
            .with("Director", director)
            .with("Year", year)
            .with("Runtime", runtime)
    }

    fn training_rows() -> Vec<RawRecord> {
        vec![
            movie("Drama", "Nolan", 2010, 148),
            movie("Action", "Cameron", 1997, 194),
            movie("Drama", "Spielberg", 1993, 127),
            movie("Comedy", "Nolan", 2000, 113),
        ]
    }

    fn encoder(unseen: UnseenCategoryPolicy) -> CategoricalEncoder {
        CategoricalEncoder::new(movie_layout(), EncoderConfig { unseen })
    }

    #[test]
    fn test_schema_layout_and_reference_levels() {
        let (matrix, schema) = encoder(UnseenCategoryPolicy::Ignore)
            .fit_transform(&training_rows())
            .unwrap();

        assert_eq!(
            schema.columns(),
            [
                "Year",
                "Runtime",
                "Genre_Action",
                "Genre_Comedy",
                "Director_Cameron",
                "Director_Spielberg",
            ]
        );
        assert_eq!(schema.reference_level("Genre"), Some("Drama"));
        assert_eq!(schema.reference_level("Director"), Some("Nolan"));
        assert_eq!(matrix.ncols(), schema.len());
        assert_eq!(matrix.nrows(), 4);

        // Action / Cameron row
        assert_eq!(matrix.row(1).to_vec(), vec![1997.0, 194.0, 1.0, 0.0, 1.0, 0.0]);
        // Drama / Nolan is the reference on both blocks
        assert_eq!(matrix.row(0).to_vec(), vec![2010.0, 148.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_schema_stable_across_fits() {
        let enc = encoder(UnseenCategoryPolicy::Ignore);
        let (_, first) = enc.fit_transform(&training_rows()).unwrap();
        let (_, second) = enc.fit_transform(&training_rows()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_one_matches_training_row() {
        let enc = encoder(UnseenCategoryPolicy::Ignore);
        let rows = training_rows();
        let (matrix, schema) = enc.fit_transform(&rows).unwrap();

        for (i, record) in rows.iter().enumerate() {
            let vector = enc.transform_one(record, &schema).unwrap();
            assert_eq!(vector.len(), schema.len());
            assert_eq!(vector, matrix.row(i));
        }
    }

    #[test]
    fn test_transform_one_is_idempotent() {
        let enc = encoder(UnseenCategoryPolicy::Ignore);
        let (_, schema) = enc.fit_transform(&training_rows()).unwrap();
        let record = movie("Comedy", "Spielberg", 2005, 100);

        let a = enc.transform_one(&record, &schema).unwrap();
        let b = enc.transform_one(&record, &schema).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reference_levels_encode_to_zero_indicators() {
        let enc = encoder(UnseenCategoryPolicy::Reject);
        let (_, schema) = enc.fit_transform(&training_rows()).unwrap();

        let vector = enc
            .transform_one(&movie("Drama", "Nolan", 2020, 90), &schema)
            .unwrap();
        assert!(vector.iter().skip(2).all(|&v| v == 0.0));
    }

    #[test]
    fn test_unseen_level_is_dropped_when_ignored() {
        let enc = encoder(UnseenCategoryPolicy::Ignore);
        let (_, schema) = enc.fit_transform(&training_rows()).unwrap();

        let vector = enc
            .transform_one(&movie("Action", "Villeneuve", 2021, 155), &schema)
            .unwrap();
        assert_eq!(vector.len(), schema.len());
        for pos in schema.indicator_positions("Director") {
            assert_eq!(vector[pos], 0.0);
        }
        assert_eq!(vector[schema.position("Genre_Action").unwrap()], 1.0);
    }

    #[test]
    fn test_unseen_level_is_rejected_when_strict() {
        let enc = encoder(UnseenCategoryPolicy::Reject);
        let (_, schema) = enc.fit_transform(&training_rows()).unwrap();

        let err = enc
            .transform_one(&movie("Action", "Villeneuve", 2021, 155), &schema)
            .unwrap_err();
        assert_eq!(
            err,
            FeatureError::UnseenCategory {
                column: "Director".to_string(),
                level: "Villeneuve".to_string(),
            }
        );
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let enc = encoder(UnseenCategoryPolicy::Ignore);
        let (_, schema) = enc.fit_transform(&training_rows()).unwrap();

        let forward = movie("Comedy", "Cameron", 2001, 99);
        let reversed: RawRecord = [
            ("Runtime", 99_i64.into()),
            ("Year", 2001_i64.into()),
            ("Director", "Cameron".into()),
            ("Genre", crate::RawValue::from("Comedy")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            enc.transform_one(&forward, &schema).unwrap(),
            enc.transform_one(&reversed, &schema).unwrap()
        );
    }

    #[rstest]
    #[case("Genre")]
    #[case("Director")]
    #[case("Year")]
    #[case("Runtime")]
    fn test_missing_raw_field_is_reported(#[case] field: &str) {
        let enc = encoder(UnseenCategoryPolicy::Ignore);
        let (_, schema) = enc.fit_transform(&training_rows()).unwrap();

        let record: RawRecord = movie("Drama", "Nolan", 2000, 100)
            .iter()
            .filter(|(name, _)| *name != field)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        assert_eq!(
            enc.transform_one(&record, &schema).unwrap_err(),
            FeatureError::MissingField {
                field: field.to_string()
            }
        );
    }

    #[test]
    fn test_missing_numeric_training_cells_use_median() {
        let mut rows = training_rows();
        rows.push(
            RawRecord::new()
                .with("Genre", "Drama")
                .with("Director", "Nolan")
                .with("Runtime", 120_i64),
        );

        let (matrix, schema) = encoder(UnseenCategoryPolicy::Ignore)
            .fit_transform(&rows)
            .unwrap();
        let year = schema.position("Year").unwrap();
        // median of 2010, 1997, 1993, 2000
        assert_eq!(matrix[[4, year]], 1998.5);
    }

    #[test]
    fn test_empty_inputs() {
        let enc = encoder(UnseenCategoryPolicy::Ignore);
        assert_eq!(enc.fit_transform(&[]).unwrap_err(), FeatureError::EmptyTable);

        let rows = vec![RawRecord::new()
            .with("Genre", "Drama")
            .with("Director", "Nolan")
            .with("Runtime", 120_i64)];
        assert_eq!(
            enc.fit_transform(&rows).unwrap_err(),
            FeatureError::EmptyColumn("Year".to_string())
        );
    }

    #[test]
    fn test_numeric_categories_render_without_fraction() {
        let layout = TableLayout::new(vec![ColumnSpec::categorical("Year")]);
        let enc = CategoricalEncoder::new(layout, EncoderConfig::default());
        let rows = vec![
            RawRecord::new().with("Year", 2019_i64),
            RawRecord::new().with("Year", 2020_i64),
        ];
        let (_, schema) = enc.fit_transform(&rows).unwrap();
        assert_eq!(schema.columns(), ["Year_2020"]);
    }
}
