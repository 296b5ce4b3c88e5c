use std::collections::{BTreeMap, HashMap};

use crate::domain::entities::pillar::Pillar;
use crate::domain::errors::ScoringError;
use crate::domain::value_objects::baseline::Baseline;

/// Per-pillar baselines together with the minimum history needed to trust
/// them
#[derive(Debug, Clone, Default)]
pub struct PillarBaselines {
    baselines: HashMap<Pillar, Baseline>,
    min_samples: usize,
}

impl PillarBaselines {
    pub fn new(min_samples: usize) -> Self {
        PillarBaselines {
            baselines: HashMap::new(),
            min_samples,
        }
    }

    pub fn with(mut self, pillar: Pillar, baseline: Baseline) -> Self {
        self.baselines.insert(pillar, baseline);
        self
    }

    /// Build baselines from per-pillar historical samples
    pub fn from_history(history: &BTreeMap<Pillar, Vec<f64>>, min_samples: usize) -> Self {
        let baselines = history
            .iter()
            .filter_map(|(pillar, samples)| {
                Baseline::from_samples(samples).map(|baseline| (*pillar, baseline))
            })
            .collect();
        PillarBaselines {
            baselines,
            min_samples,
        }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Baseline for `pillar`, or the reason it cannot be used
    pub fn lookup(&self, pillar: Pillar) -> Result<&Baseline, ScoringError> {
        let baseline = self
            .baselines
            .get(&pillar)
            .ok_or(ScoringError::InsufficientHistory {
                pillar,
                required: self.min_samples,
                available: 0,
            })?;

        if baseline.samples() < self.min_samples {
            return Err(ScoringError::InsufficientHistory {
                pillar,
                required: self.min_samples,
                available: baseline.samples(),
            });
        }

        if baseline.is_degenerate() {
            return Err(ScoringError::DegenerateBaseline {
                pillar,
                std_dev: baseline.std_dev(),
            });
        }

        Ok(baseline)
    }
}

/// Converts a raw pillar magnitude into a comparable deviation
pub trait PillarNormalizer {
    fn normalize(
        &self,
        pillar: Pillar,
        magnitude: f64,
        baselines: &PillarBaselines,
    ) -> Result<f64, ScoringError>;
}

/// z-score against the pillar baseline, optionally clamped to
/// `[-z_cap, z_cap]`
#[derive(Debug, Clone, Default)]
pub struct ZScoreNormalizer {
    pub z_cap: Option<f64>,
}

impl PillarNormalizer for ZScoreNormalizer {
    fn normalize(
        &self,
        pillar: Pillar,
        magnitude: f64,
        baselines: &PillarBaselines,
    ) -> Result<f64, ScoringError> {
        let baseline = baselines.lookup(pillar)?;
        let z = baseline
            .z_score(magnitude)
            .ok_or_else(|| ScoringError::malformed(pillar.as_str(), "magnitude is not finite"))?;

        Ok(match self.z_cap {
            Some(cap) => z.clamp(-cap.abs(), cap.abs()),
            None => z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_baselines() -> PillarBaselines {
        PillarBaselines::new(5).with(Pillar::Filings, Baseline::new(1.0, 1.0, 30).unwrap())
    }

    #[test]
    fn test_lookup_missing_pillar_is_insufficient_history() {
        let baselines = unit_baselines();
        assert_eq!(
            baselines.lookup(Pillar::Awards).unwrap_err(),
            ScoringError::InsufficientHistory {
                pillar: Pillar::Awards,
                required: 5,
                available: 0
            }
        );
    }

    #[test]
    fn test_lookup_too_few_samples() {
        let baselines =
            PillarBaselines::new(5).with(Pillar::Etf, Baseline::new(0.0, 2.0, 3).unwrap());
        assert_eq!(
            baselines.lookup(Pillar::Etf).unwrap_err(),
            ScoringError::InsufficientHistory {
                pillar: Pillar::Etf,
                required: 5,
                available: 3
            }
        );
    }

    #[test]
    fn test_lookup_degenerate_baseline() {
        let baselines =
            PillarBaselines::new(2).with(Pillar::Patents, Baseline::new(1.0, 0.0, 10).unwrap());
        assert!(matches!(
            baselines.lookup(Pillar::Patents),
            Err(ScoringError::DegenerateBaseline { .. })
        ));
    }

    #[test]
    fn test_constant_usd_history_is_degenerate() {
        let mut history = BTreeMap::new();
        history.insert(Pillar::Awards, vec![1234567.89; 10]);
        let baselines = PillarBaselines::from_history(&history, 5);

        assert!(matches!(
            baselines.lookup(Pillar::Awards),
            Err(ScoringError::DegenerateBaseline { .. })
        ));
        assert!(ZScoreNormalizer::default()
            .normalize(Pillar::Awards, 2.0 * 1234567.89, &baselines)
            .is_err());
    }

    #[test]
    fn test_from_history_counts_samples() {
        let mut history = BTreeMap::new();
        history.insert(Pillar::Awards, vec![1.0, 2.0, 3.0]);
        history.insert(Pillar::Patents, vec![]);
        let baselines = PillarBaselines::from_history(&history, 3);

        let awards = baselines.lookup(Pillar::Awards).unwrap();
        assert_eq!(awards.samples(), 3);
        assert!((awards.mean() - 2.0).abs() < 1e-12);
        assert!(baselines.lookup(Pillar::Patents).is_err());
    }

    #[test]
    fn test_z_score_normalizer() {
        let normalizer = ZScoreNormalizer::default();
        let baselines = unit_baselines();
        assert_eq!(
            normalizer.normalize(Pillar::Filings, 5.0, &baselines).unwrap(),
            4.0
        );
        assert_eq!(
            normalizer.normalize(Pillar::Filings, 1.0, &baselines).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_z_score_normalizer_cap() {
        let normalizer = ZScoreNormalizer { z_cap: Some(3.0) };
        let baselines = unit_baselines();
        assert_eq!(
            normalizer.normalize(Pillar::Filings, 50.0, &baselines).unwrap(),
            3.0
        );
        assert_eq!(
            normalizer.normalize(Pillar::Filings, -50.0, &baselines).unwrap(),
            -3.0
        );
    }

    #[test]
    fn test_z_score_normalizer_non_finite_magnitude() {
        let normalizer = ZScoreNormalizer::default();
        let baselines = unit_baselines();
        assert!(matches!(
            normalizer.normalize(Pillar::Filings, f64::NAN, &baselines),
            Err(ScoringError::MalformedRecord { .. })
        ));
    }
}
