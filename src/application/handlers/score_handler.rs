use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{api_error, internal_error, ApiError};
use crate::application::state::AppState;
use crate::domain::entities::company_score::{CompanyScore, PillarContribution, PillarExclusion};
use crate::domain::entities::scoring_run::ScoringRun;
use crate::domain::services::ingestion::parse_observation_date;
use crate::domain::value_objects::company_id::CompanyId;

/// Query parameters for the ranking endpoint
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RankingQuery {
    /// Results to return (default 50, max 500)
    pub limit: Option<usize>,
    /// Drop companies scoring below this composite
    pub min_score: Option<f64>,
}

/// Query parameters for the company history endpoint
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Runs to return (default 20, max 200)
    pub limit: Option<i64>,
}

/// Query parameters for an on-demand run
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunQuery {
    /// Reference time of the run (RFC 3339 or YYYY-MM-DD), defaults to now
    pub as_of: Option<String>,
}

/// Single company score in API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub rank: Option<usize>,
    pub company: String,
    pub composite: f64,
    pub level: String,
    pub contributions: Vec<PillarContribution>,
    pub exclusions: Vec<PillarExclusion>,
    pub computed_at: String,
}

impl ScoreResponse {
    fn from_score(score: &CompanyScore, rank: Option<usize>) -> Self {
        ScoreResponse {
            rank,
            company: score.company.to_string(),
            composite: score.composite,
            level: score.level.as_str().to_string(),
            contributions: score.contributions.clone(),
            exclusions: score.exclusions.clone(),
            computed_at: score.computed_at.to_rfc3339(),
        }
    }
}

/// API response for a ranking
#[derive(Debug, Serialize, Deserialize)]
pub struct RankingResponse {
    pub run_id: Option<i64>,
    pub computed_at: String,
    pub window_start: String,
    pub window_end: String,
    /// Companies in the full run, before filtering
    pub total: usize,
    pub degraded: usize,
    pub memo_candidates: Vec<String>,
    pub scores: Vec<ScoreResponse>,
}

impl RankingResponse {
    fn from_run(
        run: &ScoringRun,
        run_id: Option<i64>,
        memo_top_n: usize,
        limit: usize,
        min_score: Option<f64>,
    ) -> Self {
        let scores = run
            .scores
            .iter()
            .enumerate()
            .filter(|(_, s)| min_score.map_or(true, |min| s.composite >= min))
            .take(limit)
            .map(|(i, s)| ScoreResponse::from_score(s, Some(i + 1)))
            .collect();

        RankingResponse {
            run_id,
            computed_at: run.computed_at.to_rfc3339(),
            window_start: run.window.start.to_rfc3339(),
            window_end: run.window.end.to_rfc3339(),
            total: run.len(),
            degraded: run.degraded_count(),
            memo_candidates: run
                .memo_candidates(memo_top_n)
                .iter()
                .map(|s| s.company.to_string())
                .collect(),
            scores,
        }
    }
}

/// API response for a company's score history
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub company: String,
    pub scores: Vec<ScoreResponse>,
}

/// Latest stored ranking
pub async fn get_latest_scores(
    State(state): State<AppState>,
    Query(params): Query<RankingQuery>,
) -> Result<Json<RankingResponse>, ApiError> {
    if params.min_score.is_some_and(|m| !m.is_finite()) {
        return Err(api_error(StatusCode::BAD_REQUEST, "min_score must be finite"));
    }
    let limit = params.limit.unwrap_or(50).clamp(1, 500);

    let run = state
        .scores
        .latest_run()
        .await
        .map_err(internal_error)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No scoring run available"))?;

    Ok(Json(RankingResponse::from_run(
        &run,
        None,
        state.service.memo_top_n(),
        limit,
        params.min_score,
    )))
}

/// Score history of one company, newest first
pub async fn get_company_scores(
    State(state): State<AppState>,
    Path(company): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let company =
        CompanyId::new(company).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let limit = params.limit.unwrap_or(20).clamp(1, 200);

    let history = state
        .scores
        .company_history(&company, limit)
        .await
        .map_err(internal_error)?;

    if history.is_empty() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("No scores for company: {}", company),
        ));
    }

    Ok(Json(HistoryResponse {
        company: company.to_string(),
        scores: history
            .iter()
            .map(|s| ScoreResponse::from_score(s, None))
            .collect(),
    }))
}

/// Score the stored records now, persist the run and return its ranking
pub async fn run_scoring(
    State(state): State<AppState>,
    Query(params): Query<RunQuery>,
) -> Result<Json<RankingResponse>, ApiError> {
    let as_of = match params.as_of.as_deref() {
        Some(raw) => parse_observation_date(raw).ok_or_else(|| {
            api_error(StatusCode::BAD_REQUEST, format!("Invalid as_of: {}", raw))
        })?,
        None => Utc::now(),
    };

    let since = state.service.windows().earliest(as_of);
    let records = state
        .activities
        .load_since(since)
        .await
        .map_err(internal_error)?;

    let run = state.service.run(&records, as_of);
    let run_id = state.scores.save_run(&run).await.map_err(internal_error)?;

    info!(run_id, scored = run.len(), "Scoring run requested over HTTP");

    Ok(Json(RankingResponse::from_run(
        &run,
        Some(run_id),
        state.service.memo_top_n(),
        run.len().max(1),
        None,
    )))
}
