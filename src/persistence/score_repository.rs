//! Score Repository
//!
//! SQLite implementation of [`ScoreStore`]. A run is stored as one
//! `scoring_runs` header plus one `company_scores` row per ranked company.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};

use super::models::{CompanyScoreRow, ScoringRunRow};
use super::{DatabaseError, DbPool};
use crate::domain::entities::company_score::CompanyScore;
use crate::domain::entities::scoring_run::{ScoringRun, ScoringWindow};
use crate::domain::repositories::score_store::{ScoreStore, StoreError, StoreResult};
use crate::domain::value_objects::company_id::CompanyId;

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::SerializationError(e) => StoreError::Corrupt(e.to_string()),
            DatabaseError::Corrupt(reason) => StoreError::Corrupt(reason),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub struct ScoreRepository {
    pool: DbPool,
}

impl ScoreRepository {
    pub fn new(pool: DbPool) -> Self {
        ScoreRepository { pool }
    }

    /// Store `run` as saved at `saved_at`. Runs are ordered and aged by this
    /// timestamp, not by their as-of time.
    pub async fn insert_run(
        &self,
        run: &ScoringRun,
        saved_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let run_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO scoring_runs
            (computed_at, window_start, window_end, saved_at, scored_count, degraded_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(run.computed_at)
        .bind(run.window.start)
        .bind(run.window.end)
        .bind(saved_at)
        .bind(run.len() as i64)
        .bind(run.degraded_count() as i64)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to insert scoring run: {}", e);
            DatabaseError::QueryError(format!("Failed to insert scoring run: {}", e))
        })?;

        for (index, score) in run.scores.iter().enumerate() {
            let contributions = serde_json::to_string(&score.contributions)?;
            let exclusions = serde_json::to_string(&score.exclusions)?;

            sqlx::query(
                r#"
                INSERT INTO company_scores
                (run_id, rank, company, composite, level, contributions_json, exclusions_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(run_id)
            .bind(index as i64 + 1)
            .bind(score.company.as_str())
            .bind(score.composite)
            .bind(score.level.as_str())
            .bind(contributions)
            .bind(exclusions)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert score for {}: {}", score.company, e);
                DatabaseError::QueryError(format!("Failed to insert company score: {}", e))
            })?;
        }

        tx.commit().await?;
        Ok(run_id)
    }

    async fn load_scores(&self, run: &ScoringRunRow) -> Result<Vec<CompanyScore>, DatabaseError> {
        let rows = sqlx::query_as::<_, CompanyScoreRow>(
            r#"
            SELECT s.run_id, s.rank, s.company, s.composite, s.level,
                   s.contributions_json, s.exclusions_json, r.computed_at
            FROM company_scores s
            JOIN scoring_runs r ON r.id = s.run_id
            WHERE s.run_id = ?1
            ORDER BY s.rank ASC
            "#,
        )
        .bind(run.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to load run scores: {}", e)))?;

        rows.into_iter().map(CompanyScoreRow::into_score).collect()
    }
}

#[async_trait]
impl ScoreStore for ScoreRepository {
    async fn save_run(&self, run: &ScoringRun) -> StoreResult<i64> {
        let run_id = self.insert_run(run, Utc::now()).await?;
        info!(
            run_id,
            computed_at = %run.computed_at,
            scored_companies = run.len(),
            "Saved scoring run"
        );
        Ok(run_id)
    }

    async fn latest_run(&self) -> StoreResult<Option<ScoringRun>> {
        let header = sqlx::query_as::<_, ScoringRunRow>(
            r#"
            SELECT id, computed_at, window_start, window_end, saved_at, scored_count, degraded_count
            FROM scoring_runs
            ORDER BY saved_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to load latest run: {}", e)))?;

        let Some(header) = header else {
            return Ok(None);
        };

        let scores = self.load_scores(&header).await?;
        if scores.len() as i64 != header.scored_count {
            return Err(StoreError::Corrupt(format!(
                "Run {} expects {} scores, found {}",
                header.id,
                header.scored_count,
                scores.len()
            )));
        }

        Ok(Some(ScoringRun {
            computed_at: header.computed_at,
            window: ScoringWindow {
                start: header.window_start,
                end: header.window_end,
            },
            scores,
        }))
    }

    async fn company_history(
        &self,
        company: &CompanyId,
        limit: i64,
    ) -> StoreResult<Vec<CompanyScore>> {
        let rows = sqlx::query_as::<_, CompanyScoreRow>(
            r#"
            SELECT s.run_id, s.rank, s.company, s.composite, s.level,
                   s.contributions_json, s.exclusions_json, r.computed_at
            FROM company_scores s
            JOIN scoring_runs r ON r.id = s.run_id
            WHERE s.company = ?1
            ORDER BY r.computed_at DESC, r.id DESC
            LIMIT ?2
            "#,
        )
        .bind(company.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to load company history: {}", e)))?;

        let scores = rows
            .into_iter()
            .map(CompanyScoreRow::into_score)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} historical scores for {}", scores.len(), company);
        Ok(scores)
    }

    async fn prune(&self, older_than_days: i64) -> StoreResult<u64> {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        sqlx::query(
            "DELETE FROM company_scores WHERE run_id IN (SELECT id FROM scoring_runs WHERE saved_at < ?1)",
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to prune scores: {}", e)))?;

        let removed = sqlx::query("DELETE FROM scoring_runs WHERE saved_at < ?1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("Failed to prune runs: {}", e)))?
            .rows_affected();

        tx.commit().await.map_err(DatabaseError::from)?;

        if removed > 0 {
            info!("Pruned {} scoring runs older than {} days", removed, older_than_days);
        }
        Ok(removed)
    }
}
