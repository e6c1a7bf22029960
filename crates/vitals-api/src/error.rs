//! API error taxonomy and response mapping.
//!
//! Every error response is a JSON `{"error": "..."}` envelope:
//! configuration problems are 400, storage failures 500, LLM upstream
//! failures 502.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vitals_store::StoreError),

    #[error("LLM upstream error: {0}")]
    Llm(String),

    #[error("HTTP server error: {0}")]
    Server(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Config(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Llm(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Config("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Llm("timeout".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Storage(vitals_store::StoreError::Decode("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
