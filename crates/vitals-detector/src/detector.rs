//! Detector strategies.
//!
//! Strategy: a sample's present parameters are each checked against a
//! [low, high] band; a value outside its band yields one alert with the
//! signed percent distance from the violated edge.
//!
//! - Range-Based takes its bands from the population table.
//! - User-Baseline derives mean ± 2σ from the warm cell of the sample's
//!   user, falling back to the population table until warm.

use crate::ranges::population_range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use vitals_baseline::BaselineRegistry;
use vitals_core::{Alert, DetectorKind, EnrichedSample, Severity, VitalParam};

/// Process-monotonic alert id source.
#[derive(Debug, Default)]
pub struct AlertSequence(AtomicU64);

impl AlertSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id, starting at 1.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Anomaly classification strategy.
///
/// Classification never fails: a missing parameter yields no alert and a
/// parameter without a band is ignored.
#[derive(Debug, Clone)]
pub enum Detector {
    /// Fixed population ranges.
    RangeBased,
    /// Learned per-user bands with population fallback.
    UserBaseline { registry: Arc<BaselineRegistry> },
}

/// Round to one decimal, as learned bands are reported to users.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Detector {
    pub fn kind(&self) -> DetectorKind {
        match self {
            Detector::RangeBased => DetectorKind::RangeBased,
            Detector::UserBaseline { .. } => DetectorKind::UserBaseline,
        }
    }

    /// Decision band for one parameter of one sample.
    fn band(&self, sample: &EnrichedSample, param: VitalParam) -> Option<(f64, f64)> {
        match self {
            Detector::RangeBased => population_range(sample.activity_level, param),
            Detector::UserBaseline { registry } => {
                let cell = registry.cell(&sample.sample.user_id, sample.activity_level, param);
                match cell {
                    Some(cell) if cell.is_warm() => {
                        let std_dev = cell.std_dev()?;
                        Some((
                            round1(cell.mean - 2.0 * std_dev),
                            round1(cell.mean + 2.0 * std_dev),
                        ))
                    }
                    // Unwarm or absent cell: population fallback.
                    _ => population_range(sample.activity_level, param),
                }
            }
        }
    }

    /// Classify a sample, emitting zero or more alerts.
    pub fn classify(&self, sample: &EnrichedSample, ids: &AlertSequence) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for (param, value) in sample.sample.present_vitals() {
            let Some((low, high)) = self.band(sample, param) else {
                continue;
            };
            if value >= low && value <= high {
                continue;
            }

            let edge = if value > high { high } else { low };
            // A zero edge has no percent distance; treat as at-the-edge.
            let deviation_percent = if edge.abs() < f64::EPSILON {
                0.0
            } else {
                100.0 * (value - edge) / edge
            };
            let severity = Severity::from_deviation(deviation_percent);

            info!(
                user_id = %sample.sample.user_id,
                parameter = %param,
                value,
                low,
                high,
                deviation_percent,
                severity = %severity,
                detector = %self.kind(),
                "Anomaly detected"
            );

            alerts.push(Alert {
                id: ids.next(),
                timestamp: sample.sample.timestamp,
                user_id: sample.sample.user_id.clone(),
                parameter: param,
                value,
                activity_level: sample.activity_level,
                normal_range: [low, high],
                deviation_percent,
                severity,
                detector_type: self.kind(),
            });
        }

        alerts
    }
}
