//! Advertising sales regressor. Amounts are in rupees.

use super::{FieldConstraint, FieldRule, PredictorSpec};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tabula_data::{TargetEncoding, TrainingTable};
use tabula_features::{ColumnSpec, RawRecord, TableLayout};
use tabula_model::{Postprocess, Task};
use tabula_output::DisplayFormat;

/// Audience age groups.
pub const AGE_GROUPS: [&str; 3] = ["Young", "Adult", "Senior"];

/// Advertising platforms.
pub const PLATFORMS: [&str; 4] = ["TV", "Social Media", "Print", "Online"];

/// Lowest sales figure reported (1 lakh).
pub const MIN_SALES: f64 = 100_000.0;

/// Highest sales figure in synthetic data (50 lakh).
const MAX_SYNTHETIC_SALES: f64 = 5_000_000.0;

const SYNTHETIC_ROWS: usize = 1000;

/// Std dev of the synthetic sales noise.
const NOISE_STD: f64 = 50_000.0;

/// Campaign inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesFeatures {
    /// TV ad spend
    pub tv: f64,
    /// Radio ad spend
    pub radio: f64,
    /// Newspaper ad spend
    pub newspaper: f64,
    /// Target age group
    pub age_group: String,
    /// Advertising platform
    pub platform: String,
}

impl From<SalesFeatures> for RawRecord {
    fn from(s: SalesFeatures) -> Self {
        Self::new()
            .with("TV", s.tv)
            .with("Radio", s.radio)
            .with("Newspaper", s.newspaper)
            .with("AgeGroup", s.age_group)
            .with("Platform", s.platform)
    }
}

fn layout() -> TableLayout {
    TableLayout::new(vec![
        ColumnSpec::numeric("TV"),
        ColumnSpec::numeric("Radio"),
        ColumnSpec::numeric("Newspaper"),
        ColumnSpec::categorical("AgeGroup"),
        ColumnSpec::categorical("Platform"),
    ])
}

/// Sales predictor definition.
pub fn spec() -> PredictorSpec {
    PredictorSpec {
        name: "sales".to_string(),
        layout: layout(),
        target: "Sales".to_string(),
        target_encoding: TargetEncoding::Numeric,
        task: Task::Regression,
        rules: ["TV", "Radio", "Newspaper"]
            .into_iter()
            .map(|f| FieldConstraint::new(f, FieldRule::NonNegative))
            .collect(),
        postprocess: Postprocess::clip(Some(MIN_SALES), None),
        display: DisplayFormat::Currency {
            title: "Sales".to_string(),
            symbol: "₹".to_string(),
        },
    }
}

/// Random campaigns whose sales are linear in ad spend plus Gaussian noise.
///
/// Sales = 0.4 TV + 0.3 radio + 0.2 newspaper + N(0, 50 000), clipped to
/// [1 lakh, 50 lakh].
pub fn synthetic(seed: u64) -> TrainingTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = TrainingTable::new(layout(), "Sales");

    for _ in 0..SYNTHETIC_ROWS {
        let tv = rng.gen_range(100_000.0..3_000_000.0);
        let radio = rng.gen_range(0.0..1_000_000.0);
        let newspaper = rng.gen_range(0.0..800_000.0);
        let age_group = AGE_GROUPS.choose(&mut rng).copied().unwrap_or_default();
        let platform = PLATFORMS.choose(&mut rng).copied().unwrap_or_default();

        let noise: f64 = rng.sample(StandardNormal);
        let sales = (0.4 * tv + 0.3 * radio + 0.2 * newspaper + NOISE_STD * noise)
            .clamp(MIN_SALES, MAX_SYNTHETIC_SALES);

        let record = RawRecord::new()
            .with("TV", tv)
            .with("Radio", radio)
            .with("Newspaper", newspaper)
            .with("AgeGroup", age_group)
            .with("Platform", platform);
        table.push(record, sales);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_sales_follow_spend() {
        let table = synthetic(11);
        assert_eq!(table.len(), 1000);
        for (record, sales) in table.rows() {
            assert!((MIN_SALES..=MAX_SYNTHETIC_SALES).contains(&sales));
            let expected = 0.4 * record.number("TV").unwrap()
                + 0.3 * record.number("Radio").unwrap()
                + 0.2 * record.number("Newspaper").unwrap();
            // five sigma of noise, or clipped
            assert!((sales - expected).abs() < 5.0 * NOISE_STD || sales == MIN_SALES);
        }
    }
}
