//! Detector error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Invalid detector selection: {0}")]
    InvalidSelection(#[from] vitals_core::CoreError),
}

pub type DetectorResult<T> = Result<T, DetectorError>;
