#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tabula/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod forest;
pub mod metrics;
pub mod model;
pub mod postprocess;

// Re-export main types
pub use forest::{ForestConfig, MaxFeatures, RandomForest};
pub use metrics::HoldoutMetrics;
pub use model::{ModelError, Prediction, PredictiveModel, Task};
pub use postprocess::{Outcome, Postprocess};
