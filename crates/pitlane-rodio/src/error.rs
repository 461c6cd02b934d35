//! Error types for the rodio backend.

use pitlane_core::BackendError;

/// Errors raised while opening the output device or loading sounds.
#[derive(Debug, thiserror::Error)]
pub enum RodioError {
    /// Failed to load audio data.
    #[error("Failed to load audio: {0}")]
    AudioLoad(String),
    /// Playback error occurred.
    #[error("Playback error: {0}")]
    Playback(String),
    /// Audio device error.
    #[error("Audio device error: {0}")]
    Device(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rodio::StreamError> for RodioError {
    fn from(err: rodio::StreamError) -> Self {
        Self::Device(err.to_string())
    }
}

impl From<rodio::PlayError> for RodioError {
    fn from(err: rodio::PlayError) -> Self {
        Self::Playback(err.to_string())
    }
}

impl From<rodio::decoder::DecoderError> for RodioError {
    fn from(err: rodio::decoder::DecoderError) -> Self {
        Self::AudioLoad(err.to_string())
    }
}

impl From<RodioError> for BackendError {
    fn from(err: RodioError) -> Self {
        match err {
            RodioError::AudioLoad(msg) => Self::Decode(msg),
            RodioError::Playback(msg) => Self::Playback(msg),
            RodioError::Device(msg) => Self::Device(msg),
            RodioError::Io(err) => Self::Device(err.to_string()),
        }
    }
}

/// A specialized Result type for rodio backend operations.
pub type Result<T> = std::result::Result<T, RodioError>;
