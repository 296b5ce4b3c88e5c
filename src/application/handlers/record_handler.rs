use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{internal_error, ApiError};
use crate::application::state::AppState;
use crate::domain::services::ingestion::ingest_json;

#[derive(Debug, Serialize, Deserialize)]
pub struct DroppedResponse {
    pub index: usize,
    pub error: String,
}

/// Outcome of one ingestion batch
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub submitted: usize,
    pub accepted: usize,
    /// Accepted records that were new to the store
    pub inserted: u64,
    pub duplicates: u64,
    pub dropped: Vec<DroppedResponse>,
}

/// Validate and store a batch of raw activity rows. Malformed rows are
/// reported back, never rejected as a whole.
pub async fn ingest_records(
    State(state): State<AppState>,
    Json(rows): Json<Vec<Value>>,
) -> Result<Json<IngestResponse>, ApiError> {
    let submitted = rows.len();
    let report = ingest_json(rows);

    let inserted = state
        .activities
        .insert_batch(&report.records)
        .await
        .map_err(internal_error)?;

    Ok(Json(IngestResponse {
        submitted,
        accepted: report.accepted(),
        inserted,
        duplicates: report.accepted() as u64 - inserted,
        dropped: report
            .dropped
            .into_iter()
            .map(|d| DroppedResponse {
                index: d.index,
                error: d.error.to_string(),
            })
            .collect(),
    }))
}
