//! HTTP surface: ingestion, on-demand scoring runs and ranking queries.

pub mod handlers;
pub mod state;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::rate_limit::{rate_limit_middleware, GlobalRateLimiter};
use handlers::{health_handler, record_handler, score_handler};
use state::AppState;

/// Build the application router
pub fn build_router(state: AppState, limiter: GlobalRateLimiter, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler::health_check))
        .route("/summary", get(health_handler::get_summary))
        .route("/records", post(record_handler::ingest_records))
        .route("/scores", get(score_handler::get_latest_scores))
        .route("/scores/run", post(score_handler::run_scoring))
        .route("/scores/:company", get(score_handler::get_company_scores))
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
