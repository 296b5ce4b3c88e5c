//! Persistence Layer
//!
//! SQLite storage for ingested activity records and scoring runs, via sqlx.
//!
//! # Database Schema
//!
//! ## activity_records
//! - id: Serial
//! - company: Company identifier
//! - pillar: "filings", "awards", "patents" or "etf"
//! - magnitude: Signed magnitude in pillar units
//! - observed_at: Timestamp
//! - source: Upstream label (e.g., "SEC 13F")
//! - reference: Fund, agency, patent title or ETF and direction
//! - natural_key: Identity of the observation within company, pillar, date
//!   and source
//!
//! Duplicate observations are ignored on insert.
//!
//! ## scoring_runs
//! - id: Serial
//! - computed_at: Reference (as-of) time the run scored
//! - saved_at: Wall-clock time the run was stored; orders runs and drives
//!   retention
//! - window_start / window_end: Current window the run scored
//! - scored_count / degraded_count
//!
//! ## company_scores
//! - run_id: Foreign key to scoring_runs
//! - rank: 1-based position in the run
//! - company, composite, level
//! - contributions_json / exclusions_json: per-pillar detail

pub mod activity_repository;
pub mod memory_store;
pub mod models;
pub mod score_repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Initialize the database connection pool and run migrations
///
/// # Errors
/// Returns error if database connection fails or migrations fail
pub async fn init_database(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", config.url);

    // Ensure data directory exists
    if let Some(db_path) = config.url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
                })?;
            }
        }
    }

    let level = if config.log_queries {
        tracing::log::LevelFilter::Debug
    } else {
        tracing::log::LevelFilter::Off
    };
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .log_statements(level);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS activity_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company TEXT NOT NULL,
            pillar TEXT NOT NULL CHECK(pillar IN ('filings', 'awards', 'patents', 'etf')),
            magnitude REAL NOT NULL,
            observed_at DATETIME NOT NULL,
            source TEXT NOT NULL,
            reference TEXT NOT NULL DEFAULT '',
            natural_key TEXT NOT NULL DEFAULT '',
            ingested_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (company, pillar, observed_at, source, natural_key)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create activity_records table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scoring_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            computed_at DATETIME NOT NULL,
            window_start DATETIME NOT NULL,
            window_end DATETIME NOT NULL,
            scored_count INTEGER NOT NULL,
            degraded_count INTEGER NOT NULL,
            saved_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create scoring_runs table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS company_scores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id INTEGER NOT NULL,
            rank INTEGER NOT NULL,
            company TEXT NOT NULL,
            composite REAL NOT NULL,
            level TEXT NOT NULL,
            contributions_json TEXT NOT NULL,
            exclusions_json TEXT NOT NULL,
            FOREIGN KEY (run_id) REFERENCES scoring_runs(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create company_scores table: {}", e))
    })?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activity_observed_at ON activity_records(observed_at)",
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activity_pillar ON activity_records(pillar, observed_at)",
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_runs_saved_at ON scoring_runs(saved_at)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scores_run_rank ON company_scores(run_id, rank)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scores_company ON company_scores(company)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    info!("✓ Database migrations completed successfully");

    Ok(())
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://data/insti_flow.db")
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Enable query logging
    pub log_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/insti_flow.db".to_string(),
            max_connections: 5,
            log_queries: cfg!(debug_assertions),
        }
    }
}

impl DatabaseConfig {
    /// Private in-memory database. A single connection keeps every query on
    /// the same database.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            log_queries: false,
        }
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let url = match std::env::var("DATABASE_URL") {
            Ok(url) if url.starts_with("sqlite:") => url,
            Ok(url) => {
                tracing::warn!(
                    "Unsupported DATABASE_URL '{}' (expected sqlite:), using default: {}",
                    url,
                    defaults.url
                );
                defaults.url
            }
            Err(_) => defaults.url,
        };

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(defaults.max_connections);

        let log_queries = std::env::var("DATABASE_LOG_QUERIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.log_queries);

        Self {
            url,
            max_connections,
            log_queries,
        }
    }
}
