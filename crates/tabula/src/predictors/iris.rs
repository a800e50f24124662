//! Iris species classifier.

use super::{FieldConstraint, FieldRule, PredictorSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tabula_data::{TargetEncoding, TrainingTable};
use tabula_features::{ColumnSpec, RawRecord, TableLayout};
use tabula_model::{Postprocess, Task};
use tabula_output::DisplayFormat;

/// Class labels in index order.
pub const SPECIES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// Measurement fields in declaration order.
pub const FIELDS: [&str; 4] = ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Rows generated per species.
const ROWS_PER_SPECIES: usize = 50;

/// `(mean, std_dev)` in cm of each field, per species.
const PROFILES: [[(f64, f64); 4]; 3] = [
    [(5.01, 0.35), (3.43, 0.38), (1.46, 0.17), (0.25, 0.11)],
    [(5.94, 0.52), (2.77, 0.31), (4.26, 0.47), (1.33, 0.20)],
    [(6.59, 0.64), (2.97, 0.32), (5.55, 0.55), (2.03, 0.27)],
];

/// Flower measurements in centimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrisMeasurements {
    /// Sepal length
    pub sepal_length: f64,
    /// Sepal width
    pub sepal_width: f64,
    /// Petal length
    pub petal_length: f64,
    /// Petal width
    pub petal_width: f64,
}

impl From<IrisMeasurements> for RawRecord {
    fn from(m: IrisMeasurements) -> Self {
        Self::new()
            .with("sepal_length", m.sepal_length)
            .with("sepal_width", m.sepal_width)
            .with("petal_length", m.petal_length)
            .with("petal_width", m.petal_width)
    }
}

/// Iris predictor definition.
pub fn spec() -> PredictorSpec {
    PredictorSpec {
        name: "iris".to_string(),
        layout: FIELDS.into_iter().map(ColumnSpec::numeric).collect(),
        target: "species".to_string(),
        target_encoding: TargetEncoding::Labels {
            labels: SPECIES.iter().map(ToString::to_string).collect(),
        },
        task: Task::Classification,
        rules: FIELDS
            .into_iter()
            .map(|f| FieldConstraint::new(f, FieldRule::Positive))
            .collect(),
        postprocess: Postprocess::classify(SPECIES),
        display: DisplayFormat::Label {
            title: "Species".to_string(),
        },
    }
}

/// Per-species Gaussian measurements, rounded to 0.1 cm.
pub fn synthetic(seed: u64) -> TrainingTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let layout: TableLayout = FIELDS.into_iter().map(ColumnSpec::numeric).collect();
    let mut table = TrainingTable::new(layout, "species");

    for (class, profile) in PROFILES.iter().enumerate() {
        for _ in 0..ROWS_PER_SPECIES {
            let mut record = RawRecord::new();
            for (field, &(mean, std_dev)) in FIELDS.iter().zip(profile) {
                let z: f64 = rng.sample(StandardNormal);
                let value = ((mean + std_dev * z) * 10.0).round() / 10.0;
                record.insert(*field, value.max(0.1));
            }
            table.push(record, class as f64);
        }
    }
    table
}
