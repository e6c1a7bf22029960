//! Vital-sign parameter enumeration.
//!
//! One variant per numeric column of the vitals table. The five clinical
//! parameters are subject to anomaly detection; `Activity` participates in
//! trend aggregation only.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A numeric vital-sign parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalParam {
    HeartRate,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    Temperature,
    OxygenSaturation,
    Activity,
}

impl VitalParam {
    /// Every parameter, including activity.
    pub const ALL: [VitalParam; 6] = [
        VitalParam::HeartRate,
        VitalParam::BloodPressureSystolic,
        VitalParam::BloodPressureDiastolic,
        VitalParam::Temperature,
        VitalParam::OxygenSaturation,
        VitalParam::Activity,
    ];

    /// Parameters subject to anomaly detection.
    pub const DETECTABLE: [VitalParam; 5] = [
        VitalParam::HeartRate,
        VitalParam::BloodPressureSystolic,
        VitalParam::BloodPressureDiastolic,
        VitalParam::Temperature,
        VitalParam::OxygenSaturation,
    ];

    /// Wire name, which is also the vitals table column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalParam::HeartRate => "heart_rate",
            VitalParam::BloodPressureSystolic => "blood_pressure_systolic",
            VitalParam::BloodPressureDiastolic => "blood_pressure_diastolic",
            VitalParam::Temperature => "temperature",
            VitalParam::OxygenSaturation => "oxygen_saturation",
            VitalParam::Activity => "activity",
        }
    }

    /// Measurement unit, used in chart labels and the LLM prompt.
    pub fn unit(&self) -> &'static str {
        match self {
            VitalParam::HeartRate => "bpm",
            VitalParam::BloodPressureSystolic | VitalParam::BloodPressureDiastolic => "mmHg",
            VitalParam::Temperature => "°C",
            VitalParam::OxygenSaturation => "%",
            VitalParam::Activity => "steps/min",
        }
    }

    /// Whether the parameter is subject to anomaly detection.
    pub fn is_detectable(&self) -> bool {
        !matches!(self, VitalParam::Activity)
    }
}

impl FromStr for VitalParam {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart_rate" => Ok(VitalParam::HeartRate),
            "blood_pressure_systolic" => Ok(VitalParam::BloodPressureSystolic),
            "blood_pressure_diastolic" => Ok(VitalParam::BloodPressureDiastolic),
            "temperature" => Ok(VitalParam::Temperature),
            "oxygen_saturation" => Ok(VitalParam::OxygenSaturation),
            "activity" => Ok(VitalParam::Activity),
            other => Err(CoreError::UnknownParameter(other.to_string())),
        }
    }
}

impl std::fmt::Display for VitalParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for param in VitalParam::ALL {
            assert_eq!(param.as_str().parse::<VitalParam>().unwrap(), param);
        }
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        assert!("pulse_ox".parse::<VitalParam>().is_err());
    }

    #[test]
    fn test_activity_not_detectable() {
        assert!(!VitalParam::Activity.is_detectable());
        assert!(VitalParam::DETECTABLE.iter().all(|p| p.is_detectable()));
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&VitalParam::OxygenSaturation).unwrap(),
            "\"oxygen_saturation\""
        );
    }
}
