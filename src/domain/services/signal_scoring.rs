use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::ScoringConfig;
use crate::domain::entities::activity_record::ActivityRecord;
use crate::domain::entities::pillar::Pillar;
use crate::domain::entities::scoring_run::ScoringRun;
use crate::domain::errors::ScoringError;
use crate::domain::services::activity_window::{split_window, WindowSpec};
use crate::domain::services::scoring::{PillarBaselines, SignalScorer, ZScoreNormalizer};

/// Runs the scorer over a read-only snapshot of activity records.
///
/// Holds only configuration; every call is independent and repeatable.
pub struct SignalScoringService {
    scorer: SignalScorer,
    windows: WindowSpec,
    min_history_samples: usize,
    memo_top_n: usize,
}

impl SignalScoringService {
    pub fn new(config: &ScoringConfig) -> Result<Self, ScoringError> {
        config.weights.validate()?;
        let windows = config.window_spec();
        windows.validate()?;

        let normalizer = ZScoreNormalizer {
            z_cap: config.z_score_cap,
        };
        let scorer = SignalScorer::with_normalizer(normalizer, config.weights)
            .with_policy(config.missing_history_policy);

        Ok(SignalScoringService {
            scorer,
            windows,
            min_history_samples: config.min_history_samples,
            memo_top_n: config.memo_top_n,
        })
    }

    pub fn windows(&self) -> &WindowSpec {
        &self.windows
    }

    pub fn memo_top_n(&self) -> usize {
        self.memo_top_n
    }

    /// Score the records relative to `as_of`
    pub fn run(&self, records: &[ActivityRecord], as_of: DateTime<Utc>) -> ScoringRun {
        let snapshot = split_window(records, as_of, &self.windows);
        let baselines = PillarBaselines::from_history(&snapshot.history, self.min_history_samples);

        for pillar in Pillar::ALL {
            let used_now = snapshot
                .input
                .values()
                .any(|pillars| pillars.contains_key(&pillar));
            if !used_now {
                continue;
            }
            match baselines.lookup(pillar) {
                Ok(baseline) => debug!(
                    pillar = %pillar,
                    mean = baseline.mean(),
                    std_dev = baseline.std_dev(),
                    samples = baseline.samples(),
                    "Pillar baseline ready"
                ),
                Err(err) if err.is_degradation() => warn!(
                    pillar = %pillar,
                    history_samples = snapshot.history_len(pillar),
                    reason = %err,
                    "Degraded scoring: pillar excluded from composites"
                ),
                Err(err) => error!(
                    pillar = %pillar,
                    reason = %err,
                    "Pillar baseline unusable"
                ),
            }
        }

        let scores = self.scorer.score(&snapshot.input, &baselines, as_of);

        let run = ScoringRun {
            computed_at: as_of,
            window: snapshot.window,
            scores,
        };

        info!(
            as_of = %as_of,
            record_count = records.len(),
            ignored_records = snapshot.ignored,
            candidate_companies = snapshot.input.len(),
            scored_companies = run.len(),
            degraded_companies = run.degraded_count(),
            "Completed scoring run"
        );

        run
    }
}
