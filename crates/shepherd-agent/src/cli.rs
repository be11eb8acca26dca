//! Command-line arguments for the agent binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::client::RetryPolicy;

/// Tail a log file and forward each new line to a Shepherd server.
#[derive(Debug, Clone, Parser)]
#[command(name = "shepherd-agent", version, about)]
pub struct AgentArgs {
    /// Path to the log file to tail.
    #[arg(long)]
    pub file: PathBuf,

    /// Base URL of the Shepherd server.
    #[arg(long, default_value = "http://localhost:8000")]
    pub backend: String,

    /// Retries per line after the first failed attempt.
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// Backoff before the first retry, in milliseconds. Doubles per retry.
    #[arg(long, default_value_t = 500)]
    pub retry_backoff_ms: u64,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 5)]
    pub request_timeout_secs: u64,

    /// Fallback poll interval when no file events arrive, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Forward lines already in the file instead of starting at its end.
    #[arg(long)]
    pub from_start: bool,

    /// Log level filter (e.g., "info", "shepherd_agent=debug").
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl AgentArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Poll interval, never shorter than 10ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}
