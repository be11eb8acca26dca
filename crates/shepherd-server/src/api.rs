//! Ingestion endpoint and the shared API error type.

use crate::hub::HubError;
use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shepherd_types::{IngestRequest, IngestResponse};
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Expected outcomes such as acknowledging an unknown event are not errors
/// and never reach this type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<HubError> for ApiError {
    fn from(e: HubError) -> Self {
        ApiError::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Handler for `POST /ingest`.
///
/// Accepts any line, including empty or unclassifiable ones.
pub async fn ingest_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let event = state.hub.ingest(&payload.raw).map_err(|e| {
        tracing::error!("failed to ingest log line: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(IngestResponse {
        ok: true,
        id: event.id,
    }))
}
