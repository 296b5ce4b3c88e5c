use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::pillar::Pillar;
use crate::domain::value_objects::company_id::CompanyId;

/// How unusual a composite score is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    /// Composite >= 3.0
    Extreme,
    /// Composite 2.0-3.0
    Elevated,
    /// Composite 1.0-2.0
    Notable,
    /// Composite < 1.0
    Normal,
}

impl ActivityLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 3.0 => ActivityLevel::Extreme,
            s if s >= 2.0 => ActivityLevel::Elevated,
            s if s >= 1.0 => ActivityLevel::Notable,
            _ => ActivityLevel::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Extreme => "Extreme",
            ActivityLevel::Elevated => "Elevated",
            ActivityLevel::Notable => "Notable",
            ActivityLevel::Normal => "Normal",
        }
    }
}

/// A pillar that took part in the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarContribution {
    pub pillar: Pillar,
    /// Raw magnitude in the scoring window
    pub magnitude: f64,
    /// Standardized deviation from the pillar baseline
    pub z_score: f64,
    pub weight: f64,
    /// `weight * z_score`
    pub weighted: f64,
}

/// A pillar left out of the composite, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarExclusion {
    pub pillar: Pillar,
    pub reason: String,
}

/// Composite unusual-activity score of one company for one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyScore {
    pub company: CompanyId,
    /// Weighted sum of the contributions' z-scores
    pub composite: f64,
    pub level: ActivityLevel,
    pub contributions: Vec<PillarContribution>,
    pub exclusions: Vec<PillarExclusion>,
    /// Timestamp of the run that produced this score
    pub computed_at: DateTime<Utc>,
}

impl CompanyScore {
    /// Build a score from its parts; the composite is derived from the
    /// contributions.
    pub fn new(
        company: CompanyId,
        contributions: Vec<PillarContribution>,
        exclusions: Vec<PillarExclusion>,
        computed_at: DateTime<Utc>,
    ) -> Self {
        let composite = contributions.iter().fold(0.0, |acc, c| acc + c.weighted);
        CompanyScore {
            company,
            composite,
            level: ActivityLevel::from_score(composite),
            contributions,
            exclusions,
            computed_at,
        }
    }

    pub fn contribution(&self, pillar: Pillar) -> Option<&PillarContribution> {
        self.contributions.iter().find(|c| c.pillar == pillar)
    }

    /// True when at least one pillar was excluded
    pub fn is_degraded(&self) -> bool {
        !self.exclusions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(pillar: Pillar, z_score: f64, weight: f64) -> PillarContribution {
        PillarContribution {
            pillar,
            magnitude: z_score,
            z_score,
            weight,
            weighted: z_score * weight,
        }
    }

    #[test]
    fn test_company_score_composite_is_sum_of_weighted() {
        let score = CompanyScore::new(
            CompanyId::new("ACME").unwrap(),
            vec![
                contribution(Pillar::Filings, 4.0, 0.3),
                contribution(Pillar::Awards, 2.0, 0.25),
            ],
            vec![],
            Utc::now(),
        );
        // 0.3*4.0 + 0.25*2.0 = 1.7
        assert!((score.composite - 1.7).abs() < 1e-12);
        assert_eq!(score.level, ActivityLevel::Notable);
        assert!(!score.is_degraded());
        assert_eq!(score.contribution(Pillar::Awards).unwrap().z_score, 2.0);
        assert!(score.contribution(Pillar::Etf).is_none());
    }

    #[test]
    fn test_company_score_without_contributions_is_zero() {
        let score = CompanyScore::new(
            CompanyId::new("ACME").unwrap(),
            vec![],
            vec![PillarExclusion {
                pillar: Pillar::Patents,
                reason: "no history".to_string(),
            }],
            Utc::now(),
        );
        assert_eq!(score.composite, 0.0);
        assert!(score.is_degraded());
    }

    #[test]
    fn test_activity_level_thresholds() {
        assert_eq!(ActivityLevel::from_score(3.0), ActivityLevel::Extreme);
        assert_eq!(ActivityLevel::from_score(2.5), ActivityLevel::Elevated);
        assert_eq!(ActivityLevel::from_score(1.0), ActivityLevel::Notable);
        assert_eq!(ActivityLevel::from_score(0.99), ActivityLevel::Normal);
        assert_eq!(ActivityLevel::from_score(-4.0), ActivityLevel::Normal);
    }
}
