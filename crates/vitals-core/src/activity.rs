//! Activity level classification.
//!
//! Motion intensity (steps/min) is bucketed into three levels which key
//! both the population range table and the learned baseline cells.

use serde::{Deserialize, Serialize};

/// Ternary classification of current motion intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    /// All levels, in ascending intensity order.
    pub const ALL: [ActivityLevel; 3] =
        [ActivityLevel::Low, ActivityLevel::Medium, ActivityLevel::High];

    /// Classify a steps/min reading.
    ///
    /// `> 100` is high, `> 50` is medium, everything else (including an
    /// absent reading treated as 0) is low.
    pub fn from_steps(steps_per_min: f64) -> Self {
        if steps_per_min > 100.0 {
            ActivityLevel::High
        } else if steps_per_min > 50.0 {
            ActivityLevel::Medium
        } else {
            ActivityLevel::Low
        }
    }

    /// Wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Medium => "medium",
            ActivityLevel::High => "high",
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ActivityLevel::Low),
            "medium" => Ok(ActivityLevel::Medium),
            "high" => Ok(ActivityLevel::High),
            other => Err(crate::error::CoreError::UnknownActivityLevel(
                other.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(ActivityLevel::from_steps(0.0), ActivityLevel::Low);
        assert_eq!(ActivityLevel::from_steps(20.0), ActivityLevel::Low);
        assert_eq!(ActivityLevel::from_steps(50.0), ActivityLevel::Low);
        assert_eq!(ActivityLevel::from_steps(50.1), ActivityLevel::Medium);
        assert_eq!(ActivityLevel::from_steps(100.0), ActivityLevel::Medium);
        assert_eq!(ActivityLevel::from_steps(100.1), ActivityLevel::High);
        assert_eq!(ActivityLevel::from_steps(250.0), ActivityLevel::High);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ActivityLevel::Medium).unwrap(),
            "\"medium\""
        );
        let parsed: ActivityLevel = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, ActivityLevel::High);
    }
}
