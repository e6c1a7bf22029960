//! Per-user learned baseline registry.
//!
//! Maintains running Gaussian summaries (count, mean, variance via Welford)
//! for each (user, activity level, parameter) combination. Learning is
//! online and in-memory; the registry is fed only with samples the detector
//! classified as normal, so anomalies cannot poison the mean.

pub mod cell;
pub mod registry;

pub use cell::{BaselineCell, WARM_SAMPLE_COUNT};
pub use registry::{BaselineKey, BaselineRegistry, LevelBaselines, ParamBaseline, UserBaselines};
