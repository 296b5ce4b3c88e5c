//! In-memory [`ScoreStore`], for tests and database-less runs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::company_score::CompanyScore;
use crate::domain::entities::scoring_run::ScoringRun;
use crate::domain::repositories::score_store::{ScoreStore, StoreResult};
use crate::domain::value_objects::company_id::CompanyId;

struct StoredRun {
    id: i64,
    saved_at: DateTime<Utc>,
    run: ScoringRun,
}

#[derive(Default)]
pub struct InMemoryScoreStore {
    runs: RwLock<Vec<StoredRun>>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `run` as saved at `saved_at`
    pub async fn insert_run(&self, run: &ScoringRun, saved_at: DateTime<Utc>) -> i64 {
        let mut runs = self.runs.write().await;
        let id = runs.last().map(|stored| stored.id + 1).unwrap_or(1);
        runs.push(StoredRun {
            id,
            saved_at,
            run: run.clone(),
        });
        id
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn save_run(&self, run: &ScoringRun) -> StoreResult<i64> {
        Ok(self.insert_run(run, Utc::now()).await)
    }

    async fn latest_run(&self) -> StoreResult<Option<ScoringRun>> {
        let runs = self.runs.read().await;
        Ok(runs
            .iter()
            .max_by_key(|stored| (stored.saved_at, stored.id))
            .map(|stored| stored.run.clone()))
    }

    async fn company_history(
        &self,
        company: &CompanyId,
        limit: i64,
    ) -> StoreResult<Vec<CompanyScore>> {
        let runs = self.runs.read().await;
        let mut ordered: Vec<&StoredRun> = runs.iter().collect();
        ordered.sort_by(|a, b| (b.run.computed_at, b.id).cmp(&(a.run.computed_at, a.id)));

        Ok(ordered
            .into_iter()
            .filter_map(|stored| stored.run.scores.iter().find(|s| &s.company == company))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn prune(&self, older_than_days: i64) -> StoreResult<u64> {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let mut runs = self.runs.write().await;
        let before = runs.len();
        runs.retain(|stored| stored.saved_at >= cutoff);
        Ok((before - runs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::scoring_run::ScoringWindow;
    use chrono::DateTime;

    fn run(at: DateTime<Utc>, companies: &[&str]) -> ScoringRun {
        ScoringRun {
            computed_at: at,
            window: ScoringWindow {
                start: at - Duration::days(7),
                end: at,
            },
            scores: companies
                .iter()
                .map(|c| CompanyScore::new(CompanyId::new(*c).unwrap(), vec![], vec![], at))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_latest_and_history() {
        let store = InMemoryScoreStore::new();
        let now = Utc::now();

        store.save_run(&run(now, &["ACME"])).await.unwrap();
        store
            .save_run(&run(now - Duration::days(7), &["ACME", "GLOBEX"]))
            .await
            .unwrap();

        // Last saved wins, even with an earlier as-of
        let latest = store.latest_run().await.unwrap().unwrap();
        assert_eq!(latest.computed_at, now - Duration::days(7));

        let acme = CompanyId::new("ACME").unwrap();
        let history = store.company_history(&acme, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].computed_at, now);

        let globex = CompanyId::new("GLOBEX").unwrap();
        assert_eq!(store.company_history(&globex, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_prune() {
        let store = InMemoryScoreStore::new();
        let now = Utc::now();
        store
            .insert_run(&run(now, &["ACME"]), now - Duration::days(200))
            .await;
        store.save_run(&run(now - Duration::days(300), &["ACME"])).await.unwrap();

        assert_eq!(store.prune(180).await.unwrap(), 1);
        assert_eq!(store.prune(180).await.unwrap(), 0);

        let latest = store.latest_run().await.unwrap().unwrap();
        assert_eq!(latest.computed_at, now - Duration::days(300));
    }
}
