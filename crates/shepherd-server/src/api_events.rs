//! Listing and acknowledgement endpoints.

use crate::api::ApiError;
use crate::hub::HubError;
use crate::AppState;
use axum::extract::{Extension, Json, Path};
use shepherd_ledger::LedgerError;
use shepherd_types::{AckResponse, EventId, EventsResponse};
use std::sync::Arc;

/// Handler for `GET /events`.
///
/// Returns every event in ingestion order.
pub async fn list_events_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.hub.events().map_err(|e| {
        tracing::error!("failed to list events: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(EventsResponse { events }))
}

/// Handler for `POST /acknowledge/{eventId}`.
///
/// An unknown id, including one that is not a valid UUID, is a normal
/// `{"ok": false, "error": "not_found"}` answer rather than an HTTP error.
pub async fn acknowledge_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<AckResponse>, ApiError> {
    let Ok(id) = event_id.parse::<EventId>() else {
        tracing::debug!(event_id = %event_id, "acknowledge for malformed event id");
        return Ok(Json(AckResponse::not_found()));
    };

    match state.hub.acknowledge(&id) {
        Ok(_) => Ok(Json(AckResponse::acknowledged())),
        Err(HubError::Ledger(LedgerError::NotFound(_))) => {
            tracing::debug!(event_id = %id, "acknowledge for unknown event");
            Ok(Json(AckResponse::not_found()))
        }
        Err(e) => {
            tracing::error!(event_id = %id, "failed to acknowledge event: {}", e);
            Err(e.into())
        }
    }
}
