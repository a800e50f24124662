//! Artifact locations.
//!
//! Trained bundles live in a platform-specific cache directory unless a path
//! is given on the command line.

use std::path::{Path, PathBuf};
use tabula::PredictorKind;

/// Get the default artifact directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/tabula/`
/// - macOS: `~/Library/Caches/tabula/`
/// - Windows: `%LOCALAPPDATA%\tabula\`
pub(crate) fn default_artifact_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tabula")
}

/// Get the default artifact path of a predictor.
pub(crate) fn default_artifact_path(kind: PredictorKind) -> PathBuf {
    default_artifact_dir().join(format!("{}.json", kind.name()))
}

/// Resolve an optional command-line path.
pub(crate) fn resolve(kind: PredictorKind, path: Option<&Path>) -> PathBuf {
    path.map_or_else(|| default_artifact_path(kind), Path::to_path_buf)
}
