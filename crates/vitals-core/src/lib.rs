//! Core domain types for the vital-signs monitoring backend.
//!
//! This crate provides the fundamental types used throughout the system:
//! - `RawSample`, `EnrichedSample`: per-subject vital-sign measurements
//! - `ActivityLevel`, `VitalParam`: classification and parameter enums
//! - `Alert`, `Severity`: anomaly records emitted by the detector
//! - `DetectorKind`, `DetectorSelection`: process-wide detector config

pub mod activity;
pub mod alert;
pub mod error;
pub mod param;
pub mod sample;

pub use activity::ActivityLevel;
pub use alert::{Alert, DetectorKind, DetectorSelection, Severity};
pub use error::{CoreError, Result};
pub use param::VitalParam;
pub use sample::{EnrichedSample, RawSample, DEFAULT_USER_ID};
