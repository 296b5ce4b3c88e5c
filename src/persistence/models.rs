//! Database Models
//!
//! Row shapes for activity records and scoring runs, and their conversion
//! back into domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::entities::activity_record::ActivityRecord;
use crate::domain::entities::company_score::{CompanyScore, PillarContribution, PillarExclusion};
use crate::domain::entities::pillar::Pillar;
use crate::domain::value_objects::company_id::CompanyId;
use crate::persistence::DatabaseError;

/// Activity record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub company: String,
    pub pillar: String, // "filings", "awards", "patents" or "etf"
    pub magnitude: f64,
    pub observed_at: DateTime<Utc>,
    pub source: String,
    pub reference: String,
}

impl ActivityRow {
    pub fn into_record(self) -> Result<ActivityRecord, DatabaseError> {
        let company = CompanyId::new(self.company).map_err(DatabaseError::QueryError)?;
        let pillar = self
            .pillar
            .parse::<Pillar>()
            .map_err(DatabaseError::QueryError)?;
        ActivityRecord::new(company, pillar, self.magnitude, self.observed_at, self.source)
            .map(|record| record.with_reference(self.reference))
            .map_err(DatabaseError::QueryError)
    }
}

/// Scoring run header in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoringRunRow {
    pub id: i64,
    pub computed_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub scored_count: i64,
    pub degraded_count: i64,
}

/// One ranked company of a stored run
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyScoreRow {
    pub run_id: i64,
    pub rank: i64,
    pub company: String,
    pub composite: f64,
    pub level: String,
    pub contributions_json: String, // JSON array
    pub exclusions_json: String,    // JSON array
    pub computed_at: DateTime<Utc>,
}

impl CompanyScoreRow {
    /// Rebuild the domain score. The composite is recomputed from the stored
    /// contributions, so it is checked against the stored value.
    pub fn into_score(self) -> Result<CompanyScore, DatabaseError> {
        let company = CompanyId::new(self.company).map_err(DatabaseError::Corrupt)?;
        let contributions: Vec<PillarContribution> =
            serde_json::from_str(&self.contributions_json)?;
        let exclusions: Vec<PillarExclusion> = serde_json::from_str(&self.exclusions_json)?;

        let score = CompanyScore::new(company, contributions, exclusions, self.computed_at);
        if (score.composite - self.composite).abs() > 1e-9 {
            return Err(DatabaseError::Corrupt(format!(
                "Stored composite {} for {} disagrees with its contributions ({})",
                self.composite, score.company, score.composite
            )));
        }
        Ok(score)
    }
}

/// Latest rows of one pillar, for the store overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarPreview {
    pub pillar: Pillar,
    pub title: String,
    pub count: i64,
    pub rows: Vec<ActivityRow>,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub activity_records: i64,
    pub scoring_runs: i64,
    pub company_scores: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_activity_row_into_record() {
        let row = ActivityRow {
            id: 1,
            company: "ACME".to_string(),
            pillar: "awards".to_string(),
            magnitude: 1_500_000.0,
            observed_at: at(),
            source: "USAspending".to_string(),
            reference: "DOD / SBIR".to_string(),
        };
        let record = row.into_record().unwrap();
        assert_eq!(record.pillar(), Pillar::Awards);
        assert_eq!(record.reference(), "DOD / SBIR");
        assert_eq!(record.company().as_str(), "ACME");
    }

    #[test]
    fn test_activity_row_rejects_unknown_pillar() {
        let row = ActivityRow {
            id: 1,
            company: "ACME".to_string(),
            pillar: "options".to_string(),
            magnitude: 1.0,
            observed_at: at(),
            source: "x".to_string(),
            reference: String::new(),
        };
        assert!(matches!(row.into_record(), Err(DatabaseError::QueryError(_))));
    }

    #[test]
    fn test_score_row_detects_tampered_composite() {
        let row = CompanyScoreRow {
            run_id: 1,
            rank: 1,
            company: "ACME".to_string(),
            composite: 9.0,
            level: "Extreme".to_string(),
            contributions_json: r#"[{"pillar":"awards","magnitude":6.0,"z_score":4.0,"weight":0.25,"weighted":1.0}]"#.to_string(),
            exclusions_json: "[]".to_string(),
            computed_at: at(),
        };
        assert!(matches!(row.into_score(), Err(DatabaseError::Corrupt(_))));
    }

    #[test]
    fn test_score_row_bad_json() {
        let row = CompanyScoreRow {
            run_id: 1,
            rank: 1,
            company: "ACME".to_string(),
            composite: 0.0,
            level: "Normal".to_string(),
            contributions_json: "not json".to_string(),
            exclusions_json: "[]".to_string(),
            computed_at: at(),
        };
        assert!(matches!(
            row.into_score(),
            Err(DatabaseError::SerializationError(_))
        ));
    }
}
