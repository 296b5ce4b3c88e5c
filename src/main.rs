use std::sync::Arc;

use instiflow::application::build_router;
use instiflow::application::state::AppState;
use instiflow::config::AppConfig;
use instiflow::domain::repositories::score_store::ScoreStore;
use instiflow::domain::services::signal_scoring::SignalScoringService;
use instiflow::persistence::activity_repository::ActivityRepository;
use instiflow::persistence::init_database;
use instiflow::persistence::score_repository::ScoreRepository;
use instiflow::rate_limit::{create_rate_limiter, RateLimiterConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env file: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "instiflow=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Institutional flow signal scorer starting...");

    let config = AppConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }
    info!(
        window_days = config.scoring.scoring_window_days,
        lookback_days = config.scoring.lookback_days,
        min_history_samples = config.scoring.min_history_samples,
        policy = ?config.scoring.missing_history_policy,
        "Scoring configuration loaded"
    );

    let pool = init_database(&config.database).await?;
    let service = SignalScoringService::new(&config.scoring)?;
    let scores: Arc<dyn ScoreStore> = Arc::new(ScoreRepository::new(pool.clone()));
    let state = AppState::new(service, ActivityRepository::new(pool), scores.clone());

    // Spawn retention task
    let retention_days = config.scoring.retention_days;
    tokio::spawn(async move {
        retention_task(scores, retention_days).await;
    });

    let limiter = create_rate_limiter(RateLimiterConfig {
        requests_per_minute: config.requests_per_minute,
    });
    let app = build_router(state, limiter, config.max_ingest_body_bytes);

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let server = axum::serve(listener, app);

    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Periodically drop stored runs past the retention horizon
async fn retention_task(scores: Arc<dyn ScoreStore>, retention_days: i64) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(6 * 60 * 60));

    loop {
        interval.tick().await;

        match scores.prune(retention_days).await {
            Ok(0) => {}
            Ok(removed) => info!("Retention: removed {} scoring runs", removed),
            Err(e) => warn!("Retention pass failed: {}", e),
        }
    }
}
