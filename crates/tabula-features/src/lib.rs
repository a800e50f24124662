#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tabula/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod encoder;
pub mod error;
pub mod layout;
pub mod record;
pub mod scaler;
pub mod schema;

pub use encoder::{CategoricalEncoder, EncoderConfig, UnseenCategoryPolicy};
pub use error::{FeatureError, Result};
pub use layout::{ColumnKind, ColumnSpec, TableLayout};
pub use record::{RawRecord, RawValue};
pub use scaler::{ColumnStats, NumericScaler, ScalerState};
pub use schema::FeatureSchema;
