//! HTTP query/control API.
//!
//! Stateless JSON endpoints under `/api`: detector inspection and
//! switching, baseline inspection and reset, the five-scale trend
//! envelope, alert history, and the LLM trend-analysis proxy. Prometheus
//! exposition lives on `/metrics`.

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod routes;
pub mod server;

pub use config::HttpConfig;
pub use context::ApiContext;
pub use error::{ApiError, ApiResult};
pub use llm::{LlmClient, LlmConfig, TrendAnalysisRequest};
pub use routes::create_router;
pub use server::run_server;
