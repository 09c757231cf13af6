//! Throughput statistics over a series of bytes-per-cycle samples.

use serde::{Deserialize, Serialize};

/// Summary of one cycle-accurate pass.
///
/// Variance is the population variance: squared deviations are divided by
/// the sample count, not by `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of samples.
    pub samples: usize,
    /// Arithmetic mean in bytes per cycle.
    pub mean: f64,
    /// Population variance.
    pub variance: f64,
    /// Square root of the variance.
    pub std_deviation: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

impl Statistics {
    /// Computes statistics, or `None` for an empty series.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));

        Some(Self {
            samples: samples.len(),
            mean,
            variance,
            std_deviation: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Bytes per cycle for one call. A zero-cycle delta counts as one cycle.
#[must_use]
pub fn bytes_per_cycle(bytes: usize, cycles: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = bytes as f64 / cycles.max(1) as f64;
    ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_constant_series_has_no_spread() {
        let stats = Statistics::from_samples(&[2.5; 8]).unwrap();
        assert_eq!(stats.samples, 8);
        assert!((stats.mean - 2.5).abs() < EPSILON);
        assert!(stats.variance.abs() < EPSILON);
        assert!(stats.std_deviation.abs() < EPSILON);
    }

    #[test]
    fn test_population_variance() {
        let stats = Statistics::from_samples(&[1.0, 2.0, 3.0]).unwrap();
        assert!((stats.mean - 2.0).abs() < EPSILON);
        assert!((stats.variance - 2.0 / 3.0).abs() < EPSILON);
        assert!((stats.std_deviation - 0.816_496_580_927_726).abs() < 1e-9);
        assert!((stats.min - 1.0).abs() < EPSILON);
        assert!((stats.max - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_empty_series() {
        assert!(Statistics::from_samples(&[]).is_none());
    }

    #[test]
    fn test_bytes_per_cycle_clamps_zero_cycles() {
        assert!((bytes_per_cycle(4096, 0) - 4096.0).abs() < EPSILON);
        assert!((bytes_per_cycle(4096, 1024) - 4.0).abs() < EPSILON);
    }

    proptest! {
        #[test]
        fn prop_mean_within_bounds(samples in prop::collection::vec(0.0f64..1.0e6, 1..200)) {
            let stats = Statistics::from_samples(&samples).unwrap();
            prop_assert!(stats.mean >= stats.min - 1e-6);
            prop_assert!(stats.mean <= stats.max + 1e-6);
            prop_assert!(stats.variance >= 0.0);
            prop_assert!((stats.std_deviation * stats.std_deviation - stats.variance).abs()
                <= 1e-6 * stats.variance.max(1.0));
        }
    }
}
