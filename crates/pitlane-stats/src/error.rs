//! Error types for record persistence.

use std::path::PathBuf;

/// Errors raised while loading or saving records.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// Reading or writing the stats file failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The stats file is not valid JSON.
    #[error("invalid stats data: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized Result type for record persistence.
pub type Result<T> = std::result::Result<T, StatsError>;
