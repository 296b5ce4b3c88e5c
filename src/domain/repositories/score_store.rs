//! Score Store Trait
//!
//! Storage seam for scoring runs. The scoring service produces runs; whoever
//! keeps them (SQLite, memory) implements this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::company_score::CompanyScore;
use crate::domain::entities::scoring_run::ScoringRun;
use crate::domain::value_objects::company_id::CompanyId;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Score store backend error: {0}")]
    Backend(String),

    #[error("Corrupt stored score: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Persist a run; returns its identifier
    async fn save_run(&self, run: &ScoringRun) -> StoreResult<i64>;

    /// Most recently saved run. Runs are ordered by when they were saved,
    /// so a backfill for an earlier as-of time still becomes the latest.
    async fn latest_run(&self) -> StoreResult<Option<ScoringRun>>;

    /// Scores of one company across runs, newest as-of time first
    async fn company_history(
        &self,
        company: &CompanyId,
        limit: i64,
    ) -> StoreResult<Vec<CompanyScore>>;

    /// Delete runs saved more than `older_than_days` ago; returns the number
    /// of runs removed
    async fn prune(&self, older_than_days: i64) -> StoreResult<u64>;
}
