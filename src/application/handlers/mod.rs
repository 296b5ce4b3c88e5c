pub mod health_handler;
pub mod record_handler;
pub mod score_handler;

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Storage failures are logged in full and reported as 500
pub(crate) fn internal_error(err: impl std::fmt::Display) -> ApiError {
    error!("Request failed: {}", err);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
