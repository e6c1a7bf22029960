//! Anomaly alerts and detector selection.

use crate::activity::ActivityLevel;
use crate::error::CoreError;
use crate::param::VitalParam;
use crate::sample::DEFAULT_USER_ID;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Alert severity, monotone in the absolute deviation percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify a signed deviation percent.
    ///
    /// `|dev| < 10` is low, `10 <= |dev| < 20` is medium, `>= 20` is high.
    pub fn from_deviation(deviation_percent: f64) -> Self {
        let magnitude = deviation_percent.abs();
        if magnitude >= 20.0 {
            Severity::High
        } else if magnitude >= 10.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(CoreError::UnknownSeverity(other.to_string())),
        }
    }
}

/// Which classification strategy produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    RangeBased,
    UserBaseline,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::RangeBased => "range_based",
            DetectorKind::UserBaseline => "user_baseline",
        }
    }
}

impl FromStr for DetectorKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "range_based" => Ok(DetectorKind::RangeBased),
            "user_baseline" => Ok(DetectorKind::UserBaseline),
            other => Err(CoreError::UnknownDetector(other.to_string())),
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide detector selection.
///
/// Exactly one selection is active; it mutates only through the switch
/// operation (API or config topic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorSelection {
    pub detector_type: DetectorKind,
    #[serde(default = "default_selection_user")]
    pub user_id: String,
}

fn default_selection_user() -> String {
    DEFAULT_USER_ID.to_string()
}

impl DetectorSelection {
    /// Reject selections the engine cannot install.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.user_id.trim().is_empty() {
            return Err(CoreError::EmptyUserId);
        }
        Ok(())
    }
}

impl Default for DetectorSelection {
    fn default() -> Self {
        Self {
            detector_type: DetectorKind::RangeBased,
            user_id: default_selection_user(),
        }
    }
}

/// One anomaly record.
///
/// `normal_range` is the `[low, high]` band used for the decision and
/// `deviation_percent` is the signed percent distance from the violated
/// edge. Alerts are append-only once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Monotonic per process.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub parameter: VitalParam,
    pub value: f64,
    pub activity_level: ActivityLevel,
    pub normal_range: [f64; 2],
    pub deviation_percent: f64,
    pub severity: Severity,
    pub detector_type: DetectorKind,
}
