use serde::{Deserialize, Serialize};

use crate::domain::entities::pillar::Pillar;
use crate::domain::errors::ScoringError;

/// Weight of each pillar in the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarWeights {
    pub filings: f64,
    pub awards: f64,
    pub patents: f64,
    pub etf: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        PillarWeights {
            filings: 0.30,
            awards: 0.25,
            patents: 0.20,
            etf: 0.25,
        }
    }
}

impl PillarWeights {
    /// Same weight for every pillar
    pub fn uniform(weight: f64) -> Self {
        PillarWeights {
            filings: weight,
            awards: weight,
            patents: weight,
            etf: weight,
        }
    }

    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Filings => self.filings,
            Pillar::Awards => self.awards,
            Pillar::Patents => self.patents,
            Pillar::Etf => self.etf,
        }
    }

    pub fn set(&mut self, pillar: Pillar, weight: f64) {
        match pillar {
            Pillar::Filings => self.filings = weight,
            Pillar::Awards => self.awards = weight,
            Pillar::Patents => self.patents = weight,
            Pillar::Etf => self.etf = weight,
        }
    }

    pub fn total(&self) -> f64 {
        Pillar::ALL.iter().map(|p| self.get(*p)).sum()
    }

    /// Weights must be finite, non-negative and not all zero
    pub fn validate(&self) -> Result<(), ScoringError> {
        for pillar in Pillar::ALL {
            let weight = self.get(pillar);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoringError::InvalidConfiguration(format!(
                    "weight for {} must be finite and non-negative, got {}",
                    pillar, weight
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(ScoringError::InvalidConfiguration(
                "at least one pillar weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
