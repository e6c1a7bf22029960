//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Row decode error: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
