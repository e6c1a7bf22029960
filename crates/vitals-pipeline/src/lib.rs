//! Ingestion pipeline.
//!
//! One consumer task drains raw payloads from the broker gateway, parses
//! and validates them, and routes each sample to a sticky worker chosen by
//! hashing the user id, preserving per-user FIFO. Workers enrich,
//! classify, feed the baseline registry with non-alerting values, persist
//! best-effort, and republish. One bad sample never kills a worker.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod router;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{classify_and_learn, spawn_pipeline, IngestContext, PipelineHandles};
pub use router::worker_index;
