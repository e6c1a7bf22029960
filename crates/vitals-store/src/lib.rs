//! Time-series store adapter.
//!
//! Owns the Postgres connection pool and the two tables: `vitals`
//! (time-partitioned, hypertable when TimescaleDB is installed) and
//! `alerts` (append-only). Inserts are single-row and best-effort from the
//! caller's point of view; aggregation queries power the trend API.

pub mod config;
pub mod error;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use store::{TrendRow, VitalsStore, MAX_ALERT_HISTORY};
