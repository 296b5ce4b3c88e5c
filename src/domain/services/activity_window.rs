use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::entities::activity_record::ActivityRecord;
use crate::domain::entities::pillar::Pillar;
use crate::domain::entities::scoring_run::ScoringWindow;
use crate::domain::errors::ScoringError;
use crate::domain::services::scoring::ScoringInput;
use crate::domain::value_objects::company_id::CompanyId;

/// Lengths of the current scoring window and of the trailing history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub scoring_window: Duration,
    pub lookback: Duration,
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec {
            scoring_window: Duration::days(7),
            lookback: Duration::days(91),
        }
    }
}

impl WindowSpec {
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.scoring_window <= Duration::zero() {
            return Err(ScoringError::InvalidConfiguration(
                "scoring window must be positive".to_string(),
            ));
        }
        if self.lookback <= self.scoring_window {
            return Err(ScoringError::InvalidConfiguration(format!(
                "lookback ({} days) must be longer than the scoring window ({} days)",
                self.lookback.num_days(),
                self.scoring_window.num_days()
            )));
        }
        Ok(())
    }

    /// Earliest timestamp any record must exceed to matter for `as_of`
    pub fn earliest(&self, as_of: DateTime<Utc>) -> DateTime<Utc> {
        as_of - self.lookback
    }

    pub fn current_window(&self, as_of: DateTime<Utc>) -> ScoringWindow {
        ScoringWindow {
            start: as_of - self.scoring_window,
            end: as_of,
        }
    }
}

/// Records split into current-window magnitudes and historical samples
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySnapshot {
    pub window: ScoringWindow,
    /// Summed magnitudes per company and pillar in the current window
    pub input: ScoringInput,
    /// Per-pillar samples: one per (company, window-sized period) bucket
    pub history: BTreeMap<Pillar, Vec<f64>>,
    /// Records outside the lookback or after `as_of`
    pub ignored: usize,
}

impl ActivitySnapshot {
    pub fn history_len(&self, pillar: Pillar) -> usize {
        self.history.get(&pillar).map_or(0, Vec::len)
    }
}

/// Split `records` relative to `as_of`.
///
/// A record's age is `as_of - observed_at`; period `k = age / window`.
/// Period 0 is the current window, periods `1..` up to the lookback feed
/// the baselines.
pub fn split_window(
    records: &[ActivityRecord],
    as_of: DateTime<Utc>,
    spec: &WindowSpec,
) -> ActivitySnapshot {
    let window_ms = spec.scoring_window.num_milliseconds().max(1);
    let lookback_ms = spec.lookback.num_milliseconds();

    let mut input = ScoringInput::new();
    let mut buckets: BTreeMap<(Pillar, CompanyId, i64), f64> = BTreeMap::new();
    let mut ignored = 0usize;

    for record in records {
        let age_ms = (as_of - record.observed_at()).num_milliseconds();
        if age_ms < 0 || age_ms >= lookback_ms {
            ignored += 1;
            continue;
        }

        let period = age_ms / window_ms;
        if period == 0 {
            *input
                .entry(record.company().clone())
                .or_default()
                .entry(record.pillar())
                .or_insert(0.0) += record.magnitude();
        } else {
            *buckets
                .entry((record.pillar(), record.company().clone(), period))
                .or_insert(0.0) += record.magnitude();
        }
    }

    let mut history: BTreeMap<Pillar, Vec<f64>> = BTreeMap::new();
    for ((pillar, _, _), sum) in buckets {
        history.entry(pillar).or_default().push(sum);
    }

    debug!(
        record_count = records.len(),
        current_companies = input.len(),
        history_pillars = history.len(),
        ignored = ignored,
        "Split activity records into scoring window and history"
    );

    ActivitySnapshot {
        window: spec.current_window(as_of),
        input,
        history,
        ignored,
    }
}
