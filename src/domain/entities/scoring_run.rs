use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::company_score::CompanyScore;
use crate::domain::value_objects::company_id::CompanyId;

/// Current scoring window: `start` exclusive, `end` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScoringWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at > self.start && at <= self.end
    }
}

/// Output of one scoring run, ranked best first.
///
/// Runs are never updated; a later run supersedes this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRun {
    pub computed_at: DateTime<Utc>,
    pub window: ScoringWindow,
    pub scores: Vec<CompanyScore>,
}

impl ScoringRun {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// The ranking as (company, composite) pairs
    pub fn pairs(&self) -> Vec<(CompanyId, f64)> {
        self.scores
            .iter()
            .map(|s| (s.company.clone(), s.composite))
            .collect()
    }

    /// Top `n` companies handed to the memo generator
    pub fn memo_candidates(&self, n: usize) -> &[CompanyScore] {
        &self.scores[..n.min(self.scores.len())]
    }

    pub fn degraded_count(&self) -> usize {
        self.scores.iter().filter(|s| s.is_degraded()).count()
    }

    pub fn position_of(&self, company: &CompanyId) -> Option<usize> {
        self.scores.iter().position(|s| &s.company == company)
    }
}
