//! Welford running-statistics cell.

use tracing::warn;

/// Accepted samples required before a cell's band is trusted.
pub const WARM_SAMPLE_COUNT: u64 = 30;

/// Running Gaussian summary for one (user, activity level, parameter).
///
/// Uses Welford's online algorithm: `m2` is the running sum of squared
/// deviations, so mean and variance update in O(1) without storing samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BaselineCell {
    /// Accepted sample count.
    pub count: u64,
    /// Running mean.
    pub mean: f64,
    /// Running sum of squared deviations from the mean.
    pub m2: f64,
}

impl BaselineCell {
    /// Fold one accepted sample into the summary.
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Sample variance (n−1 divisor). None below two samples.
    ///
    /// A negative `m2` would be an invariant violation from floating-point
    /// drift; it is clamped to zero and logged rather than propagated.
    pub fn variance(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let m2 = if self.m2 < 0.0 {
            warn!(m2 = self.m2, "Negative m2 clamped to zero");
            0.0
        } else {
            self.m2
        };
        Some(m2 / (self.count - 1) as f64)
    }

    /// Sample standard deviation. None below two samples.
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Whether the cell has enough accepted samples to trust its band.
    pub fn is_warm(&self) -> bool {
        self.count >= WARM_SAMPLE_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welford_matches_naive_statistics() {
        // Mean must equal the arithmetic mean within 1e-9 and std_dev the
        // sample standard deviation.
        let values = [64.2, 66.8, 65.0, 63.1, 67.4, 64.9, 65.5, 66.1, 62.8, 65.3];
        let mut cell = BaselineCell::default();
        for v in values {
            cell.update(v);
        }

        let n = values.len() as f64;
        let naive_mean = values.iter().sum::<f64>() / n;
        let naive_var =
            values.iter().map(|v| (v - naive_mean).powi(2)).sum::<f64>() / (n - 1.0);

        assert!((cell.mean - naive_mean).abs() < 1e-9);
        assert!((cell.variance().unwrap() - naive_var).abs() < 1e-9);
        assert!((cell.std_dev().unwrap() - naive_var.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_known_values() {
        let mut cell = BaselineCell::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            cell.update(v);
        }
        assert!((cell.mean - 5.0).abs() < 1e-9);
        // Sum of squared deviations = 32, sample variance = 32/7.
        assert!((cell.variance().unwrap() - 32.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_variance_needs_two_samples() {
        let mut cell = BaselineCell::default();
        assert!(cell.variance().is_none());
        cell.update(65.0);
        assert!(cell.variance().is_none());
        cell.update(66.0);
        assert!(cell.variance().is_some());
    }

    #[test]
    fn test_negative_m2_clamped() {
        let cell = BaselineCell {
            count: 10,
            mean: 65.0,
            m2: -1e-12,
        };
        assert_eq!(cell.variance(), Some(0.0));
        assert_eq!(cell.std_dev(), Some(0.0));
    }

    #[test]
    fn test_warmup_threshold() {
        let mut cell = BaselineCell::default();
        for _ in 0..(WARM_SAMPLE_COUNT - 1) {
            cell.update(65.0);
        }
        assert!(!cell.is_warm());
        cell.update(65.0);
        assert!(cell.is_warm());
    }
}
