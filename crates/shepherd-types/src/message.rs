//! Frames pushed to live viewers and bodies of the HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::{Event, EventId};

/// A message fanned out to every connected viewer.
///
/// Tagged by `type` on the wire:
///
/// ```json
/// {"type":"init","events":[...]}
/// {"type":"log_event","event":{...}}
/// {"type":"ack","id":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BroadcastMessage {
    /// Full ledger snapshot, sent once as the first frame of a connection.
    Init { events: Vec<Event> },
    /// A newly ingested event.
    LogEvent { event: Event },
    /// An event was acknowledged. Viewers apply it to their local copy.
    Ack { id: EventId },
}

impl BroadcastMessage {
    /// Returns the wire tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::LogEvent { .. } => "log_event",
            Self::Ack { .. } => "ack",
        }
    }
}

/// Request body for `POST /ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// One raw line, without its trailing newline.
    pub raw: String,
}

/// Response body for `POST /ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ok: bool,
    /// Identifier of the stored event.
    pub id: EventId,
}

/// Response body for `POST /acknowledge/{event_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    /// The event was found and acknowledged.
    pub fn acknowledged() -> Self {
        Self { ok: true, error: None }
    }

    /// No event with the requested id exists.
    pub fn not_found() -> Self {
        Self {
            ok: false,
            error: Some("not_found".to_string()),
        }
    }
}

/// Response body for `GET /events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    /// All events in ingestion order.
    pub events: Vec<Event>,
}
