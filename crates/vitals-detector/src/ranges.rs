//! Population normal ranges.
//!
//! Fixed [low, high] bands per (activity level, parameter). These are the
//! Range-Based strategy's decision table and the warm-up fallback for the
//! User-Baseline strategy.

use vitals_core::{ActivityLevel, VitalParam};

/// Population [low, high] band for one (activity level, parameter).
///
/// Returns None for parameters that are not subject to detection.
pub fn population_range(level: ActivityLevel, param: VitalParam) -> Option<(f64, f64)> {
    use ActivityLevel::*;
    use VitalParam::*;

    let band = match (level, param) {
        (Low, HeartRate) => (60.0, 80.0),
        (Medium, HeartRate) => (80.0, 100.0),
        (High, HeartRate) => (100.0, 160.0),

        (Low, BloodPressureSystolic) => (110.0, 120.0),
        (Medium, BloodPressureSystolic) => (120.0, 140.0),
        (High, BloodPressureSystolic) => (140.0, 160.0),

        (Low, BloodPressureDiastolic) => (70.0, 80.0),
        (Medium, BloodPressureDiastolic) => (80.0, 90.0),
        (High, BloodPressureDiastolic) => (90.0, 100.0),

        (Low, Temperature) => (36.1, 37.2),
        (Medium, Temperature) => (36.5, 37.5),
        (High, Temperature) => (37.0, 38.0),

        (Low, OxygenSaturation) => (95.0, 100.0),
        (Medium, OxygenSaturation) => (94.0, 99.0),
        (High, OxygenSaturation) => (92.0, 98.0),

        (_, Activity) => return None,
    };
    Some(band)
}
