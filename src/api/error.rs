use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::detection::AnalysisError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(ref msg) => {
                log::warn!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.as_str())
            }
            // The handler logs the cause, clients only learn that it failed
            ApiError::Analysis(_) | ApiError::Task(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
