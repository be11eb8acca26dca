//! Error types for the line-forwarding agent.

use std::path::PathBuf;

/// Errors that can occur while tailing or forwarding lines.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Reading the tailed file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The filesystem watcher could not be set up.
    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    /// The request never produced a usable response.
    #[error("ingest request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend rejected line with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl AgentError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            // A body that fails to decode means the line was already accepted.
            Self::Http(e) => !e.is_decode(),
            Self::Rejected { status, .. } => *status >= 500,
            Self::Io { .. } | Self::Watch(_) => false,
        }
    }
}
