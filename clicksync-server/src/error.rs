//! Error types for clicksync-server
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation, and maps them onto HTTP responses for the control API.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for clicksync-server
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Calibration store errors
    #[error("Calibration store error: {0}")]
    Store(String),

    /// Scheduler task unavailable
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using clicksync-server Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<clicksync_common::Error> for Error {
    fn from(e: clicksync_common::Error) -> Self {
        use clicksync_common::Error as Common;
        match e {
            Common::InvalidInput(msg) => Error::BadRequest(msg),
            Common::Config(msg) => Error::Config(msg),
            Common::Io(e) => Error::Io(e),
            Common::Json(e) => Error::Json(e),
            Common::Internal(msg) => Error::Internal(msg),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

/// Error body returned by the control API
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Scheduler(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(StatusResponse {
                status: format!("error: {}", self),
            }),
        )
            .into_response()
    }
}
