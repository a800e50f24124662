#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tabula/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod display;
pub mod export;
pub mod report;

pub use display::{DisplayFormat, group_thousands};
pub use export::{ExportError, ExportFormat, Exporter, PredictionExport};
pub use report::{ReportError, TrainingReport, TrainingReportBuilder};
