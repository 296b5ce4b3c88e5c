use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{internal_error, ApiError};
use crate::application::state::AppState;
use crate::persistence::models::PillarPreview;

const PREVIEW_ROWS: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Store overview: row counts, the latest rows of each pillar and the
/// latest run
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub activity_records: i64,
    pub scoring_runs: i64,
    pub company_scores: i64,
    pub latest_run_at: Option<String>,
    pub previews: Vec<PillarPreview>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let counts = state
        .activities
        .table_counts()
        .await
        .map_err(internal_error)?;
    let previews = state
        .activities
        .previews(PREVIEW_ROWS)
        .await
        .map_err(internal_error)?;
    let latest = state.scores.latest_run().await.map_err(internal_error)?;

    Ok(Json(SummaryResponse {
        activity_records: counts.activity_records,
        scoring_runs: counts.scoring_runs,
        company_scores: counts.company_scores,
        latest_run_at: latest.map(|run| run.computed_at.to_rfc3339()),
        previews,
    }))
}
