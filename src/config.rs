use chrono::Duration;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::entities::pillar::Pillar;
use crate::domain::services::activity_window::WindowSpec;
use crate::domain::services::scoring::{MissingHistoryPolicy, PillarWeights};
use crate::persistence::DatabaseConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid scoring configuration: {0}")]
    InvalidScoring(String),

    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),
}

/// Parameters of a scoring run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: PillarWeights,
    pub scoring_window_days: i64, // Length of the current window
    pub lookback_days: i64,       // Trailing history feeding the baselines
    pub min_history_samples: usize,
    pub missing_history_policy: MissingHistoryPolicy,
    pub z_score_cap: Option<f64>,
    pub memo_top_n: usize,    // Companies handed to the memo generator
    pub retention_days: i64,  // Stored runs older than this are pruned
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            weights: PillarWeights::default(),
            scoring_window_days: 7,
            lookback_days: 91, // 13 weekly periods
            min_history_samples: 5,
            missing_history_policy: MissingHistoryPolicy::Exclude,
            z_score_cap: None,
            memo_top_n: 10,
            retention_days: 180,
        }
    }
}

impl ScoringConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ScoringConfig {
        let mut config = ScoringConfig::default();

        for pillar in Pillar::ALL {
            let key = format!("SCORING_WEIGHT_{}", pillar.as_str().to_ascii_uppercase());
            if let Some(value) = env_parse::<f64>(&key, |v| v.is_finite() && *v >= 0.0) {
                config.weights.set(pillar, value);
            }
        }

        if let Some(value) = env_parse::<i64>("SCORING_WINDOW_DAYS", |v| (1..=365).contains(v)) {
            config.scoring_window_days = value;
        }

        if let Some(value) = env_parse::<i64>("SCORING_LOOKBACK_DAYS", |v| (2..=3650).contains(v)) {
            config.lookback_days = value;
        }

        if let Some(value) = env_parse::<usize>("SCORING_MIN_HISTORY_SAMPLES", |v| *v >= 2) {
            config.min_history_samples = value;
        }

        if let Some(value) = env_parse::<MissingHistoryPolicy>("SCORING_MISSING_HISTORY_POLICY", |_| true) {
            config.missing_history_policy = value;
        }

        if let Some(value) = env_parse::<f64>("SCORING_Z_SCORE_CAP", |v| v.is_finite() && *v > 0.0) {
            config.z_score_cap = Some(value);
        }

        if let Some(value) = env_parse::<usize>("SCORING_MEMO_TOP_N", |v| (1..=500).contains(v)) {
            config.memo_top_n = value;
        }

        if let Some(value) = env_parse::<i64>("SCORING_RETENTION_DAYS", |v| *v >= 1) {
            config.retention_days = value;
        }

        config
    }

    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec {
            scoring_window: Duration::days(self.scoring_window_days),
            lookback: Duration::days(self.lookback_days),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights
            .validate()
            .map_err(|e| ConfigError::InvalidScoring(e.to_string()))?;
        self.window_spec()
            .validate()
            .map_err(|e| ConfigError::InvalidScoring(e.to_string()))?;
        if self.min_history_samples < 2 {
            return Err(ConfigError::InvalidScoring(
                "min_history_samples must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Process-level configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub requests_per_minute: u32,
    pub max_ingest_body_bytes: usize,
    pub scoring: ScoringConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database: DatabaseConfig::default(),
            requests_per_minute: 100,
            max_ingest_body_bytes: 2 * 1024 * 1024,
            scoring: ScoringConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppConfig {
        let mut config = AppConfig::default();

        if let Some(addr) = env_parse::<SocketAddr>("BIND_ADDR", |_| true) {
            config.bind_addr = addr;
        }

        config.database = DatabaseConfig::from_env();

        if let Some(value) = env_parse::<u32>("RATE_LIMIT_PER_MINUTE", |v| *v > 0) {
            config.requests_per_minute = value;
        }

        if let Some(value) = env_parse::<usize>("MAX_INGEST_BODY_BYTES", |v| *v >= 1024) {
            config.max_ingest_body_bytes = value;
        }

        config.scoring = ScoringConfig::from_env();
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests_per_minute == 0 {
            return Err(ConfigError::InvalidServer(
                "requests_per_minute must be positive".to_string(),
            ));
        }
        self.scoring.validate()
    }
}

/// Read and parse `key`, keeping the default (and logging) when the value
/// is unparsable or rejected by `accept`.
fn env_parse<T>(key: &str, accept: impl Fn(&T) -> bool) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if accept(&value) => Some(value),
        Ok(_) => {
            tracing::warn!("Out of range value for {}: '{}', using default", key, raw);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to parse {} '{}': {}, using default", key, raw, e);
            None
        }
    }
}
