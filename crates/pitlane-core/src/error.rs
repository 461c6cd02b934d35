//! Error types for Pitlane.

use std::path::PathBuf;

/// Errors returned when a request cannot be submitted to the sound worker.
///
/// These are backpressure signals, not failures: the caller decides whether
/// to retry, drop the sound, or fall back to another path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The message queue is full; the worker is saturated.
    #[error("Sound queue is full ({capacity} pending messages)")]
    QueueSaturated {
        /// Capacity of the queue that rejected the request.
        capacity: usize,
    },
    /// The dispatcher has been shut down and no longer accepts requests.
    #[error("Sound dispatcher has been shut down")]
    ShutDown,
}

/// Errors reported by an audio backend.
///
/// The worker never stops on these; it logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The audio device is unavailable or failed.
    #[error("Audio device error: {0}")]
    Device(String),
    /// The sound could not be started.
    #[error("Playback error: {0}")]
    Playback(String),
    /// The sound data could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML or has wrongly typed fields.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("Invalid config value for '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Create an out-of-range error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// The main error type for constructing Pitlane services.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration was rejected.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// The worker thread could not be spawned.
    #[error("Failed to spawn sound worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A specialized Result type for Pitlane operations.
pub type Result<T> = std::result::Result<T, Error>;
