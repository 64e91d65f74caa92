//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience result alias for this crate.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Why settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The settings file is not valid JSON or does not match the schema.
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}
