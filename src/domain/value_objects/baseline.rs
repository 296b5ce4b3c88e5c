use serde::{Deserialize, Serialize};

/// Historical reference distribution of one pillar's magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    mean: f64,
    std_dev: f64,
    samples: usize,
}

impl Baseline {
    pub fn new(mean: f64, std_dev: f64, samples: usize) -> Result<Self, String> {
        if !mean.is_finite() {
            return Err("Baseline mean must be finite".to_string());
        }
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err("Baseline standard deviation must be finite and non-negative".to_string());
        }
        Ok(Baseline {
            mean,
            std_dev,
            samples,
        })
    }

    /// Population mean and standard deviation of `samples`.
    ///
    /// Returns `None` for an empty slice or when any sample is not finite.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() || samples.iter().any(|s| !s.is_finite()) {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Baseline::new(mean, variance.sqrt(), samples.len()).ok()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// A zero-width distribution cannot standardize anything. The tolerance
    /// scales with the mean, since rounding in a constant history of large
    /// magnitudes leaves a tiny non-zero std-dev.
    pub fn is_degenerate(&self) -> bool {
        self.std_dev <= f64::EPSILON * self.mean.abs().max(1.0) * 16.0
    }

    /// Standardized deviation of `value` from this baseline.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.is_degenerate() || !value.is_finite() {
            return None;
        }
        Some((value - self.mean) / self.std_dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_from_samples_population_stats() {
        let baseline = Baseline::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((baseline.mean() - 5.0).abs() < 1e-12);
        assert!((baseline.std_dev() - 2.0).abs() < 1e-12);
        assert_eq!(baseline.samples(), 8);
    }

    #[test]
    fn test_baseline_from_empty_samples() {
        assert!(Baseline::from_samples(&[]).is_none());
    }

    #[test]
    fn test_baseline_from_non_finite_samples() {
        assert!(Baseline::from_samples(&[1.0, f64::NAN]).is_none());
        assert!(Baseline::from_samples(&[1.0, f64::INFINITY]).is_none());
    }

    #[test]
    fn test_baseline_rejects_negative_std_dev() {
        assert!(Baseline::new(0.0, -1.0, 10).is_err());
        assert!(Baseline::new(f64::NAN, 1.0, 10).is_err());
    }

    #[test]
    fn test_z_score() {
        let baseline = Baseline::new(1.0, 1.0, 30).unwrap();
        assert_eq!(baseline.z_score(5.0), Some(4.0));
        assert_eq!(baseline.z_score(1.0), Some(0.0));
        assert_eq!(baseline.z_score(-1.0), Some(-2.0));
    }

    #[test]
    fn test_z_score_degenerate_baseline() {
        let baseline = Baseline::from_samples(&[3.0, 3.0, 3.0]).unwrap();
        assert!(baseline.is_degenerate());
        assert_eq!(baseline.z_score(3.0), None);
    }

    #[test]
    fn test_constant_large_magnitudes_are_degenerate() {
        let baseline = Baseline::from_samples(&[1234567.89; 10]).unwrap();
        assert!(baseline.is_degenerate());
        assert_eq!(baseline.z_score(2.0 * 1234567.89), None);

        let baseline = Baseline::from_samples(&[1.0e9 + 0.3; 3]).unwrap();
        assert!(baseline.is_degenerate());
        assert_eq!(baseline.z_score(2.0e9), None);
    }

    #[test]
    fn test_large_magnitudes_with_spread_are_usable() {
        let baseline = Baseline::from_samples(&[1_000_000.0, 3_000_000.0]).unwrap();
        assert!(!baseline.is_degenerate());
        assert_eq!(baseline.z_score(6_000_000.0), Some(4.0));
    }
}
