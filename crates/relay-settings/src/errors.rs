//! Settings load errors.

use thiserror::Error;

/// Errors produced while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for the expected shape.
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        /// File that failed.
        path: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, SettingsError>;
