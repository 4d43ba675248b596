//! Error types for migsync-django.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving `manage.py`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No `manage.py` at the project root.
    #[error("manage.py not found in {0}")]
    ManagePyNotFound(PathBuf),

    /// The interpreter could not be started.
    #[error("failed to run {program}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Probe output could not be parsed.
    #[error("failed to parse INSTALLED_APPS probe output")]
    Parse(#[from] serde_json::Error),
}
