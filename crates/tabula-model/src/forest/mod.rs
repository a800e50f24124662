//! Random Forest
//!
//! Bagged ensemble of CART trees. Each tree is grown on a bootstrap sample of
//! the training rows and considers a random subset of features at every
//! split. Classification averages the trees' leaf class distributions;
//! regression averages their leaf means.
//!
//! Training is deterministic: tree `i` draws from an RNG seeded with
//! `seed + i`, so the same data and seed always give the same forest.

mod tree;

use crate::model::{ModelError, PredictiveModel, Task, check_fit_inputs};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tree::{DecisionTree, TreeParams};

/// Number of features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature
    All,
    /// `sqrt(n_features)`, rounded down, at least 1
    Sqrt,
    /// `log2(n_features)`, rounded down, at least 1
    Log2,
    /// A fixed count, capped at `n_features`
    Count(usize),
}

impl MaxFeatures {
    /// Resolve against the actual feature count
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            Self::All => n_features,
            Self::Sqrt => (n_features as f64).sqrt() as usize,
            Self::Log2 => (n_features as f64).log2() as usize,
            Self::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees (default: 100)
    pub n_estimators: usize,

    /// Maximum tree depth, unlimited when `None` (default: None)
    pub max_depth: Option<usize>,

    /// Minimum rows required to split a node (default: 2)
    pub min_samples_split: usize,

    /// Minimum rows in each child of a split (default: 1)
    pub min_samples_leaf: usize,

    /// Features considered per split; `None` picks `Sqrt` for classification
    /// and `All` for regression (default: None)
    pub max_features: Option<MaxFeatures>,

    /// Whether each tree sees a bootstrap sample (default: true)
    pub bootstrap: bool,

    /// Base random seed (default: 42)
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Default configuration with a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bagged forest of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    task: Task,
    n_classes: usize,
    n_features: Option<usize>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Unfitted classification forest
    pub const fn classifier(config: ForestConfig) -> Self {
        Self::new(Task::Classification, config)
    }

    /// Unfitted regression forest
    pub const fn regressor(config: ForestConfig) -> Self {
        Self::new(Task::Regression, config)
    }

    /// Unfitted forest for a task
    pub const fn new(task: Task, config: ForestConfig) -> Self {
        Self {
            config,
            task,
            n_classes: 0,
            n_features: None,
            trees: Vec::new(),
        }
    }

    /// Forest configuration
    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of classes (0 for regression or before fit)
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn class_count(targets: &ArrayView1<'_, f64>) -> Result<usize, ModelError> {
        let mut max = 0usize;
        for &t in targets {
            if t < 0.0 || t.fract() != 0.0 {
                return Err(ModelError::InvalidTarget(format!(
                    "class targets must be non-negative integers, got {}",
                    t
                )));
            }
            max = max.max(t as usize);
        }
        Ok(max + 1)
    }

    fn check_predict_width(&self, features: &ArrayView2<'_, f64>) -> Result<(), ModelError> {
        let expected = self.n_features.ok_or(ModelError::NotFitted)?;
        if features.ncols() != expected {
            return Err(ModelError::DimensionMismatch {
                expected,
                actual: features.ncols(),
            });
        }
        Ok(())
    }

    /// Average leaf vectors of all trees for one row.
    fn mean_leaf(&self, row: ArrayView1<'_, f64>, width: usize) -> Vec<f64> {
        let mut acc = vec![0.0; width];
        for tree in &self.trees {
            for (a, v) in acc.iter_mut().zip(tree.leaf(row)) {
                *a += v;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }
}

impl PredictiveModel for RandomForest {
    fn task(&self) -> Task {
        self.task
    }

    fn fit(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
    ) -> Result<(), ModelError> {
        self.config.validate()?;
        check_fit_inputs(&features, &targets)?;

        let (n_rows, n_features) = features.dim();
        if n_features == 0 {
            return Err(ModelError::InvalidParameter(
                "training matrix has no feature columns".to_string(),
            ));
        }

        let (n_classes, default_max_features) = match self.task {
            Task::Classification => (Self::class_count(&targets)?, MaxFeatures::Sqrt),
            Task::Regression => (0, MaxFeatures::All),
        };

        let params = TreeParams {
            task: self.task,
            n_classes,
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self
                .config
                .max_features
                .unwrap_or(default_max_features)
                .resolve(n_features),
        };

        let trees = (0..self.config.n_estimators)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
                let rows = if self.config.bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                DecisionTree::fit(features, targets, rows, &params, &mut rng)
            })
            .collect();

        // Replace the whole fitted state at once
        self.trees = trees;
        self.n_classes = n_classes;
        self.n_features = Some(n_features);

        tracing::info!(
            task = ?self.task,
            trees = self.trees.len(),
            rows = n_rows,
            features = n_features,
            max_features = params.max_features,
            "fitted random forest"
        );

        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        match self.task {
            Task::Classification => {
                let proba = self.predict_proba(features)?;
                Ok(proba
                    .axis_iter(Axis(0))
                    .map(|row| argmax(row) as f64)
                    .collect())
            }
            Task::Regression => {
                self.check_predict_width(&features)?;
                Ok(features
                    .axis_iter(Axis(0))
                    .map(|row| self.mean_leaf(row, 1)[0])
                    .collect())
            }
        }
    }

    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        if self.task != Task::Classification {
            return Err(ModelError::Unsupported("predict_proba"));
        }
        self.check_predict_width(&features)?;

        let mut proba = Array2::<f64>::zeros((features.nrows(), self.n_classes));
        for (row, mut out) in features.axis_iter(Axis(0)).zip(proba.axis_iter_mut(Axis(0))) {
            for (o, p) in out.iter_mut().zip(self.mean_leaf(row, self.n_classes)) {
                *o = p;
            }
        }
        Ok(proba)
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn validate(&self) -> Result<(), ModelError> {
        let Some(width) = self.n_features else {
            return Ok(());
        };
        if self.trees.is_empty() {
            return Err(ModelError::InvalidStructure(
                "fitted forest has no trees".to_string(),
            ));
        }
        let leaf_width = match self.task {
            Task::Classification if self.n_classes == 0 => {
                return Err(ModelError::InvalidStructure(
                    "fitted classifier has no classes".to_string(),
                ));
            }
            Task::Classification => self.n_classes,
            Task::Regression => 1,
        };
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(width, leaf_width)
                .map_err(|e| ModelError::InvalidStructure(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }
}

/// Index of the largest value, first one on ties
fn argmax(values: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
