//! Activity Repository
//!
//! Stores validated activity records and loads the snapshot a scoring run
//! reads.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};

use super::models::{ActivityRow, PillarPreview, TableCounts};
use super::{DatabaseError, DbPool};
use crate::domain::entities::activity_record::ActivityRecord;
use crate::domain::entities::pillar::Pillar;

pub struct ActivityRepository {
    pool: DbPool,
}

impl ActivityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert records in one transaction. Observations already stored are
    /// skipped; returns how many rows were actually inserted.
    pub async fn insert_batch(&self, records: &[ActivityRecord]) -> Result<u64, DatabaseError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO activity_records
                (company, pillar, magnitude, observed_at, source, reference, natural_key)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(record.company().as_str())
            .bind(record.pillar().as_str())
            .bind(record.magnitude())
            .bind(record.observed_at())
            .bind(record.source())
            .bind(record.reference())
            .bind(record.natural_key())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert activity record: {}", e);
                DatabaseError::QueryError(format!("Failed to insert activity record: {}", e))
            })?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        info!(
            submitted = records.len(),
            inserted,
            duplicates = records.len() as u64 - inserted,
            "Stored activity records"
        );
        Ok(inserted)
    }

    /// Records observed at or after `since`
    pub async fn load_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, DatabaseError> {
        // Timestamps are stored as text; the query only narrows the scan and
        // the exact bound is applied on the decoded values.
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, company, pillar, magnitude, observed_at, source, reference
            FROM activity_records
            WHERE observed_at >= ?1
            ORDER BY observed_at ASC, id ASC
            "#,
        )
        .bind(since - Duration::days(1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load activity records: {}", e);
            DatabaseError::QueryError(format!("Failed to load activity records: {}", e))
        })?;

        let records = rows
            .into_iter()
            .filter(|row| row.observed_at >= since)
            .map(ActivityRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} activity records since {}", records.len(), since);
        Ok(records)
    }

    /// Row counts of every table
    pub async fn table_counts(&self) -> Result<TableCounts, DatabaseError> {
        let (activity_records, scoring_runs, company_scores): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM activity_records),
                (SELECT COUNT(*) FROM scoring_runs),
                (SELECT COUNT(*) FROM company_scores)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("Failed to count rows: {}", e)))?;

        Ok(TableCounts {
            activity_records,
            scoring_runs,
            company_scores,
        })
    }

    /// Count and latest `limit` rows of every pillar, newest and largest
    /// first
    pub async fn previews(&self, limit: i64) -> Result<Vec<PillarPreview>, DatabaseError> {
        let mut previews = Vec::with_capacity(Pillar::ALL.len());

        for pillar in Pillar::ALL {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM activity_records WHERE pillar = ?1")
                    .bind(pillar.as_str())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| DatabaseError::QueryError(format!("Failed to count rows: {}", e)))?;

            let rows = sqlx::query_as::<_, ActivityRow>(
                r#"
                SELECT id, company, pillar, magnitude, observed_at, source, reference
                FROM activity_records
                WHERE pillar = ?1
                ORDER BY observed_at DESC, ABS(magnitude) DESC, id DESC
                LIMIT ?2
                "#,
            )
            .bind(pillar.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to load {} preview: {}", pillar, e);
                DatabaseError::QueryError(format!("Failed to load preview: {}", e))
            })?;

            previews.push(PillarPreview {
                pillar,
                title: preview_title(pillar).to_string(),
                count,
                rows,
            });
        }

        Ok(previews)
    }
}

fn preview_title(pillar: Pillar) -> &'static str {
    match pillar {
        Pillar::Filings => "Latest Holdings",
        Pillar::Awards => "Recent Federal Awards",
        Pillar::Patents => "Recent Patents",
        Pillar::Etf => "Recent ETF Trades",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::company_id::CompanyId;
    use crate::persistence::{init_database, DatabaseConfig};
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    fn record(company: &str, pillar: Pillar, magnitude: f64, days_ago: i64) -> ActivityRecord {
        ActivityRecord::new(
            CompanyId::new(company).unwrap(),
            pillar,
            magnitude,
            as_of() - Duration::days(days_ago),
            "",
        )
        .unwrap()
    }

    async fn repository() -> ActivityRepository {
        let pool = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        ActivityRepository::new(pool)
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let repo = repository().await;
        let records = vec![
            record("ACME", Pillar::Awards, 2_000_000.0, 1),
            record("GLOBEX", Pillar::Filings, -500_000.0, 3),
        ];

        assert_eq!(repo.insert_batch(&records).await.unwrap(), 2);

        let loaded = repo.load_since(as_of() - Duration::days(7)).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].company().as_str(), "GLOBEX");
        assert_eq!(loaded[0].source(), "SEC 13F");
        assert_eq!(loaded[1].magnitude(), 2_000_000.0);
    }

    #[tokio::test]
    async fn test_duplicates_are_ignored() {
        let repo = repository().await;
        let records = vec![record("ACME", Pillar::Patents, 3.0, 2)];

        assert_eq!(repo.insert_batch(&records).await.unwrap(), 1);
        assert_eq!(repo.insert_batch(&records).await.unwrap(), 0);

        let counts = repo.table_counts().await.unwrap();
        assert_eq!(counts.activity_records, 1);
    }

    #[tokio::test]
    async fn test_load_since_excludes_older_records() {
        let repo = repository().await;
        let records = vec![
            record("ACME", Pillar::Etf, 10.0, 5),
            record("ACME", Pillar::Etf, 20.0, 100),
        ];
        repo.insert_batch(&records).await.unwrap();

        let loaded = repo.load_since(as_of() - Duration::days(91)).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].magnitude(), 10.0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let repo = repository().await;
        assert_eq!(repo.insert_batch(&[]).await.unwrap(), 0);
        assert_eq!(repo.table_counts().await.unwrap(), TableCounts::default());
    }

    #[tokio::test]
    async fn test_distinct_patents_same_day_are_kept() {
        let repo = repository().await;
        let records: Vec<ActivityRecord> = ["Qubit routing", "Error correction", "Cryogenic cable"]
            .iter()
            .map(|title| record("IBM", Pillar::Patents, 1.0, 2).with_reference(*title))
            .collect();

        assert_eq!(repo.insert_batch(&records).await.unwrap(), 3);
        assert_eq!(repo.insert_batch(&records[..1]).await.unwrap(), 0);

        let loaded = repo.load_since(as_of() - Duration::days(7)).await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].reference(), "Qubit routing");
    }

    #[tokio::test]
    async fn test_same_delta_from_two_funds_is_kept() {
        let repo = repository().await;
        let records = vec![
            record("APPLE INC", Pillar::Filings, 5.0e6, 3).with_reference("Berkshire Hathaway"),
            record("APPLE INC", Pillar::Filings, 5.0e6, 3).with_reference("Vanguard"),
            record("TSLA", Pillar::Etf, 1.0e5, 3).with_reference("ARKK buy"),
            record("TSLA", Pillar::Etf, 1.0e5, 3).with_reference("ARKW buy"),
        ];
        assert_eq!(repo.insert_batch(&records).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_awards_differing_only_in_amount_are_kept() {
        let repo = repository().await;
        let records = vec![
            record("ACME", Pillar::Awards, 1.0e6, 3).with_reference("DOD"),
            record("ACME", Pillar::Awards, 2.0e6, 3).with_reference("DOD"),
        ];
        assert_eq!(repo.insert_batch(&records).await.unwrap(), 2);
        assert_eq!(repo.insert_batch(&records).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_previews_latest_rows_per_pillar() {
        let repo = repository().await;
        let records = vec![
            record("ACME", Pillar::Awards, 1.0e6, 10).with_reference("NASA"),
            record("GLOBEX", Pillar::Awards, 3.0e6, 1).with_reference("DOD / SBIR"),
            record("INITECH", Pillar::Awards, 2.0e6, 1).with_reference("DOE"),
            record("IBM", Pillar::Patents, 1.0, 4).with_reference("Qubit routing"),
        ];
        repo.insert_batch(&records).await.unwrap();

        let previews = repo.previews(2).await.unwrap();
        assert_eq!(previews.len(), 4);

        let awards = previews.iter().find(|p| p.pillar == Pillar::Awards).unwrap();
        assert_eq!(awards.title, "Recent Federal Awards");
        assert_eq!(awards.count, 3);
        assert_eq!(awards.rows.len(), 2);
        assert_eq!(awards.rows[0].company, "GLOBEX");
        assert_eq!(awards.rows[0].reference, "DOD / SBIR");
        assert_eq!(awards.rows[1].company, "INITECH");

        let etf = previews.iter().find(|p| p.pillar == Pillar::Etf).unwrap();
        assert_eq!(etf.count, 0);
        assert!(etf.rows.is_empty());
    }
}
