//! Shared types for the Shepherd log monitor.
//!
//! This crate holds the event model that every other Shepherd crate agrees
//! on: event identifiers, severity levels, the stored [`Event`] record, and
//! the JSON frames pushed to live viewers (see [`message`]).
//!
//! Nothing in here performs I/O. Serialisation shapes are part of the public
//! contract with the browser client, so field names are fixed by serde
//! attributes rather than by Rust naming.

pub mod message;

pub use message::{AckResponse, BroadcastMessage, EventsResponse, IngestRequest, IngestResponse};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, process-unique identifier of an [`Event`].
///
/// Backed by a random v4 UUID and serialised as its hyphenated string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Generates a fresh random identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Severity assigned to an ingested line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Anything below 400, including lines with no status code.
    Info,
    /// Client errors (400..=499).
    Warning,
    /// Server errors (500 and above).
    Error,
}

impl Level {
    /// Maps an HTTP-style status code to a severity.
    ///
    /// A code of `0` means "no code found" and maps to [`Level::Info`].
    pub fn from_status(code: u16) -> Self {
        match code {
            500.. => Self::Error,
            400..=499 => Self::Warning,
            _ => Self::Info,
        }
    }

    /// Returns the lowercase wire label for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown level string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level: {0}")]
pub struct ParseLevelError(pub String);

/// A single classified occurrence derived from one ingested raw line.
///
/// `acknowledged` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identifier assigned at ingestion.
    pub id: EventId,
    /// The line exactly as it was received.
    pub raw: String,
    /// First standalone three-digit number in `raw`, or `0`.
    pub status_code: u16,
    /// Severity derived from `status_code`.
    pub level: Level,
    /// Whether a viewer has marked this event as handled.
    pub acknowledged: bool,
    /// Wall-clock time of ingestion.
    pub timestamp: DateTime<Utc>,
}
