//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] vitals_store::StoreError),

    #[error("Detector error: {0}")]
    Detector(#[from] vitals_detector::DetectorError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] vitals_pipeline::PipelineError),
}

pub type AppResult<T> = Result<T, AppError>;
