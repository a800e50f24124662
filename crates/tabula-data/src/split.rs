//! Seeded train/holdout split.

use crate::error::{DataError, Result};
use crate::table::TrainingTable;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Shuffle rows with `seed` and hold out `test_fraction` of them.
///
/// A fraction of 0 keeps every row for training and returns an empty
/// holdout. Otherwise both partitions get at least one row.
///
/// # Returns
/// `(train, holdout)`
pub fn train_test_split(
    table: &TrainingTable,
    test_fraction: f64,
    seed: u64,
) -> Result<(TrainingTable, TrainingTable)> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(DataError::InvalidSplit(format!(
            "test fraction must be in [0, 1), got {}",
            test_fraction
        )));
    }
    if table.is_empty() {
        return Err(DataError::EmptyTable);
    }

    let n = table.len();
    if test_fraction == 0.0 {
        return Ok((table.clone(), table.subset(&[])));
    }
    if n < 2 {
        return Err(DataError::InvalidSplit(format!(
            "need at least 2 rows to hold out data, got {}",
            n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
    let (test, train) = indices.split_at(n_test);

    tracing::debug!(train = train.len(), holdout = test.len(), seed, "split table");
    Ok((table.subset(train), table.subset(test)))
}
