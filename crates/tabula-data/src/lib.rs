#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tabula/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod loader;
pub mod split;
pub mod table;

pub use error::{DataError, Result};
pub use loader::{read_csv, write_csv};
pub use split::train_test_split;
pub use table::{TargetEncoding, TrainingTable};
