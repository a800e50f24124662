//! Training and inference pipelines.
//!
//! Training fixes the feature schema, scaler statistics and model once;
//! inference replays them on single records. Both run single-threaded and
//! never touch a global RNG: the seed travels in [`TrainingConfig`].

pub mod error;
pub mod inference;
pub mod training;

pub use error::{PipelineError, Result, Stage};
pub use inference::InferencePipeline;
pub use training::{TrainingConfig, TrainingPipeline, TrainingSummary};
