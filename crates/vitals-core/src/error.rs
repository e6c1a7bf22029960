//! Error types for vitals-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Empty user_id")]
    EmptyUserId,

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Unknown activity level: {0}")]
    UnknownActivityLevel(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Unknown detector type: {0}")]
    UnknownDetector(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
