//! Trend time scales.
//!
//! Each scale fixes a trailing window, a bucket width, and a bucket label
//! format. The five scales are served together in one envelope.

use chrono::{DateTime, Duration, Utc};
use vitals_core::CoreError;

/// One downsampling resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeScale {
    /// Last 60 s in 5 s buckets.
    OneMin,
    /// Last 30 min in 60 s buckets.
    ThirtyMin,
    /// Last 60 min in 5 min buckets.
    OneHour,
    /// Last 24 h in 1 h buckets.
    OneDay,
    /// Last 7 d in 1 d buckets.
    SevenDay,
}

impl TimeScale {
    /// All scales, finest first.
    pub const ALL: [TimeScale; 5] = [
        TimeScale::OneMin,
        TimeScale::ThirtyMin,
        TimeScale::OneHour,
        TimeScale::OneDay,
        TimeScale::SevenDay,
    ];

    /// Envelope/API key.
    pub fn key(&self) -> &'static str {
        match self {
            TimeScale::OneMin => "1min",
            TimeScale::ThirtyMin => "30min",
            TimeScale::OneHour => "1h",
            TimeScale::OneDay => "1day",
            TimeScale::SevenDay => "7day",
        }
    }

    /// Trailing query window.
    pub fn window(&self) -> Duration {
        match self {
            TimeScale::OneMin => Duration::seconds(60),
            TimeScale::ThirtyMin => Duration::minutes(30),
            TimeScale::OneHour => Duration::hours(1),
            TimeScale::OneDay => Duration::hours(24),
            TimeScale::SevenDay => Duration::days(7),
        }
    }

    /// Bucket width in seconds.
    pub fn bucket_secs(&self) -> i64 {
        match self {
            TimeScale::OneMin => 5,
            TimeScale::ThirtyMin => 60,
            TimeScale::OneHour => 300,
            TimeScale::OneDay => 3600,
            TimeScale::SevenDay => 86_400,
        }
    }

    /// Format a bucket start time for chart labels.
    pub fn format_bucket(&self, bucket_time: DateTime<Utc>) -> String {
        let format = match self {
            TimeScale::OneMin => "%H:%M:%S",
            TimeScale::ThirtyMin | TimeScale::OneHour => "%H:%M",
            TimeScale::OneDay => "%m-%d %H",
            TimeScale::SevenDay => "%Y-%m-%d",
        };
        bucket_time.format(format).to_string()
    }
}

impl std::str::FromStr for TimeScale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1min" => Ok(TimeScale::OneMin),
            "30min" => Ok(TimeScale::ThirtyMin),
            "1h" => Ok(TimeScale::OneHour),
            "1day" => Ok(TimeScale::OneDay),
            "7day" => Ok(TimeScale::SevenDay),
            other => Err(CoreError::UnknownParameter(format!("time scale {other}"))),
        }
    }
}

impl std::fmt::Display for TimeScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_and_buckets() {
        assert_eq!(TimeScale::OneMin.window(), Duration::seconds(60));
        assert_eq!(TimeScale::OneMin.bucket_secs(), 5);
        assert_eq!(TimeScale::ThirtyMin.bucket_secs(), 60);
        assert_eq!(TimeScale::OneHour.bucket_secs(), 300);
        assert_eq!(TimeScale::OneDay.bucket_secs(), 3600);
        assert_eq!(TimeScale::SevenDay.window(), Duration::days(7));
    }

    #[test]
    fn test_bucket_labels() {
        let instant: DateTime<Utc> = "2025-03-01T08:30:05Z".parse().unwrap();
        assert_eq!(TimeScale::OneMin.format_bucket(instant), "08:30:05");
        assert_eq!(TimeScale::ThirtyMin.format_bucket(instant), "08:30");
        assert_eq!(TimeScale::OneHour.format_bucket(instant), "08:30");
        assert_eq!(TimeScale::OneDay.format_bucket(instant), "03-01 08");
        assert_eq!(TimeScale::SevenDay.format_bucket(instant), "2025-03-01");
    }

    #[test]
    fn test_key_round_trip() {
        for scale in TimeScale::ALL {
            assert_eq!(scale.key().parse::<TimeScale>().unwrap(), scale);
        }
        assert!("5min".parse::<TimeScale>().is_err());
    }
}
