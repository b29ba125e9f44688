//! Error types for clicksync-player

use thiserror::Error;

/// Main error type for clicksync-player
#[derive(Error, Debug)]
pub enum Error {
    /// Sound name not in click/clack/noise
    #[error("Unknown sound type: {0}")]
    UnknownSound(String),

    /// Output name not known to the player
    #[error("Unknown audio output: {0}")]
    UnknownOutput(String),

    /// Calibration step name not recognized
    #[error("Unknown calibration step: {0}")]
    UnknownStep(String),

    /// Local calibration file errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type using clicksync-player Error
pub type Result<T> = std::result::Result<T, Error>;
