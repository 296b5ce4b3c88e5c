use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::domain::entities::company_score::{CompanyScore, PillarContribution, PillarExclusion};
use crate::domain::entities::pillar::Pillar;
use crate::domain::services::scoring::{PillarBaselines, PillarNormalizer, PillarWeights, ZScoreNormalizer};
use crate::domain::value_objects::company_id::CompanyId;

/// Per-company, per-pillar magnitudes for the current scoring window
pub type ScoringInput = BTreeMap<CompanyId, BTreeMap<Pillar, f64>>;

/// What to do with a company none of whose pillars could be standardized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingHistoryPolicy {
    /// Leave the company out of the ranking
    #[default]
    Exclude,
    /// Keep the company with a composite of 0.0
    Zero,
}

impl FromStr for MissingHistoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(MissingHistoryPolicy::Exclude),
            "zero" => Ok(MissingHistoryPolicy::Zero),
            other => Err(format!("Unknown missing history policy: {}", other)),
        }
    }
}

/// Combines standardized pillar deviations into one composite per company
pub struct SignalScorer<N: PillarNormalizer = ZScoreNormalizer> {
    normalizer: N,
    weights: PillarWeights,
    policy: MissingHistoryPolicy,
}

impl Default for SignalScorer {
    fn default() -> Self {
        SignalScorer::new(PillarWeights::default())
    }
}

impl SignalScorer {
    pub fn new(weights: PillarWeights) -> Self {
        SignalScorer {
            normalizer: ZScoreNormalizer::default(),
            weights,
            policy: MissingHistoryPolicy::default(),
        }
    }
}

impl<N: PillarNormalizer> SignalScorer<N> {
    pub fn with_normalizer(normalizer: N, weights: PillarWeights) -> Self {
        SignalScorer {
            normalizer,
            weights,
            policy: MissingHistoryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MissingHistoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn weights(&self) -> &PillarWeights {
        &self.weights
    }

    pub fn policy(&self) -> MissingHistoryPolicy {
        self.policy
    }

    /// Score a single company
    ///
    /// Returns `None` when no pillar is usable and the policy is `Exclude`.
    pub fn score_company(
        &self,
        company: &CompanyId,
        magnitudes: &BTreeMap<Pillar, f64>,
        baselines: &PillarBaselines,
        computed_at: DateTime<Utc>,
    ) -> Option<CompanyScore> {
        let mut contributions = Vec::with_capacity(magnitudes.len());
        let mut exclusions = Vec::new();

        for (&pillar, &magnitude) in magnitudes {
            match self.normalizer.normalize(pillar, magnitude, baselines) {
                Ok(z_score) => {
                    let weight = self.weights.get(pillar);
                    debug!(
                        company = %company,
                        pillar = %pillar,
                        magnitude = magnitude,
                        z_score = z_score,
                        weight = weight,
                        "Standardized pillar magnitude"
                    );
                    contributions.push(PillarContribution {
                        pillar,
                        magnitude,
                        z_score,
                        weight,
                        weighted: weight * z_score,
                    });
                }
                Err(err) => {
                    debug!(
                        company = %company,
                        pillar = %pillar,
                        reason = %err,
                        "Pillar excluded from composite"
                    );
                    exclusions.push(PillarExclusion {
                        pillar,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if contributions.is_empty() && self.policy == MissingHistoryPolicy::Exclude {
            debug!(company = %company, "No usable pillar, company excluded");
            return None;
        }

        Some(CompanyScore::new(
            company.clone(),
            contributions,
            exclusions,
            computed_at,
        ))
    }

    /// Score every company in `input` and return them ranked
    pub fn score(
        &self,
        input: &ScoringInput,
        baselines: &PillarBaselines,
        computed_at: DateTime<Utc>,
    ) -> Vec<CompanyScore> {
        debug!(
            company_count = input.len(),
            policy = ?self.policy,
            "Starting composite scoring"
        );

        let scores = input
            .iter()
            .filter_map(|(company, magnitudes)| {
                self.score_company(company, magnitudes, baselines, computed_at)
            })
            .collect();

        rank_results(scores)
    }
}

/// Sort descending by composite; equal composites fall back to the company
/// identifier
pub fn rank_results(mut results: Vec<CompanyScore>) -> Vec<CompanyScore> {
    results.sort_by(|a, b| {
        b.composite
            .total_cmp(&a.composite)
            .then_with(|| a.company.cmp(&b.company))
    });

    for (rank, result) in results.iter().enumerate() {
        debug!(
            rank = rank + 1,
            company = %result.company,
            composite = result.composite,
            level = ?result.level,
            "Ranked company score"
        );
    }

    results
}
