//! Raw and enriched vital-sign samples.
//!
//! A `RawSample` is the wire shape published on the raw-vitals topic.
//! Every vital field is optional; missing values are skipped downstream,
//! never fabricated. An `EnrichedSample` is the same record with the
//! derived activity level attached.

use crate::activity::ActivityLevel;
use crate::error::CoreError;
use crate::param::VitalParam;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subject id used when the producer does not send one.
pub const DEFAULT_USER_ID: &str = "default";

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

/// Timestamp codec for the broker wire format.
///
/// Producers send ISO-8601; some omit the offset, in which case the
/// instant is taken as UTC.
mod ts_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse an ISO-8601 instant, accepting an omitted UTC offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidTimestamp(raw.to_string()))
}

/// One vital-sign measurement as published on the raw-vitals topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Measurement instant, ISO-8601 on the wire.
    #[serde(with = "ts_format")]
    pub timestamp: DateTime<Utc>,
    /// Opaque subject identifier.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Motion intensity in steps/min.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<f64>,
    /// Heart rate in bpm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Systolic blood pressure in mmHg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure_systolic: Option<f64>,
    /// Diastolic blood pressure in mmHg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure_diastolic: Option<f64>,
    /// Body temperature in °C.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Blood oxygen saturation in %.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f64>,
}

impl RawSample {
    /// Parse a raw broker payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, CoreError> {
        let sample: RawSample = serde_json::from_slice(payload)?;
        sample.validate()?;
        Ok(sample)
    }

    /// Reject samples the pipeline cannot attribute.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.user_id.trim().is_empty() {
            return Err(CoreError::EmptyUserId);
        }
        Ok(())
    }

    /// Steps/min with an absent reading treated as rest.
    pub fn activity_or_rest(&self) -> f64 {
        self.activity.unwrap_or(0.0)
    }

    /// Value of one parameter, if present.
    pub fn value(&self, param: VitalParam) -> Option<f64> {
        match param {
            VitalParam::HeartRate => self.heart_rate,
            VitalParam::BloodPressureSystolic => self.blood_pressure_systolic,
            VitalParam::BloodPressureDiastolic => self.blood_pressure_diastolic,
            VitalParam::Temperature => self.temperature,
            VitalParam::OxygenSaturation => self.oxygen_saturation,
            VitalParam::Activity => self.activity,
        }
    }

    /// Present detectable parameters with their values.
    pub fn present_vitals(&self) -> impl Iterator<Item = (VitalParam, f64)> + '_ {
        VitalParam::DETECTABLE
            .into_iter()
            .filter_map(|p| self.value(p).map(|v| (p, v)))
    }
}

/// A raw sample with its derived activity level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSample {
    #[serde(flatten)]
    pub sample: RawSample,
    /// Activity level derived from steps/min.
    pub activity_level: ActivityLevel,
}

impl EnrichedSample {
    /// Attach the derived activity level to a raw sample.
    pub fn enrich(sample: RawSample) -> Self {
        let activity_level = ActivityLevel::from_steps(sample.activity_or_rest());
        Self {
            sample,
            activity_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "timestamp": "2025-03-01T08:30:00Z",
            "user_id": "alice",
            "activity": 20,
            "heart_rate": 72,
            "blood_pressure_systolic": 115,
            "blood_pressure_diastolic": 75,
            "temperature": 36.8,
            "oxygen_saturation": 98
        }"#
    }

    #[test]
    fn test_parse_full_sample() {
        let sample = RawSample::from_json(sample_json().as_bytes()).unwrap();
        assert_eq!(sample.user_id, "alice");
        assert_eq!(sample.heart_rate, Some(72.0));
        assert_eq!(sample.present_vitals().count(), 5);
    }

    #[test]
    fn test_missing_fields_default() {
        let sample =
            RawSample::from_json(br#"{"timestamp": "2025-03-01T08:30:00Z"}"#).unwrap();
        assert_eq!(sample.user_id, DEFAULT_USER_ID);
        assert_eq!(sample.activity_or_rest(), 0.0);
        assert_eq!(sample.present_vitals().count(), 0);
    }

    #[test]
    fn test_naive_timestamp_taken_as_utc() {
        let sample =
            RawSample::from_json(br#"{"timestamp": "2025-03-01T08:30:00.250"}"#).unwrap();
        assert_eq!(sample.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        assert!(RawSample::from_json(br#"{"timestamp": "yesterday"}"#).is_err());
        assert!(RawSample::from_json(br#"{}"#).is_err());
    }

    #[test]
    fn test_empty_user_id_rejected() {
        let err = RawSample::from_json(
            br#"{"timestamp": "2025-03-01T08:30:00Z", "user_id": "  "}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::EmptyUserId));
    }

    #[test]
    fn test_enrichment_preserves_numeric_fields() {
        let raw = RawSample::from_json(sample_json().as_bytes()).unwrap();
        let enriched = EnrichedSample::enrich(raw.clone());
        assert_eq!(enriched.activity_level, ActivityLevel::Low);

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&enriched).unwrap()).unwrap();
        assert_eq!(value["heart_rate"], 72.0);
        assert_eq!(value["oxygen_saturation"], 98.0);
        assert_eq!(value["activity_level"], "low");

        // Absent vitals stay absent on the wire.
        let sparse = RawSample::from_json(
            br#"{"timestamp": "2025-03-01T08:30:00Z", "activity": 120}"#,
        )
        .unwrap();
        let enriched = EnrichedSample::enrich(sparse);
        assert_eq!(enriched.activity_level, ActivityLevel::High);
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&enriched).unwrap()).unwrap();
        assert!(value.get("heart_rate").is_none());
    }
}
