//! HTTP client that delivers lines to the server's ingestion endpoint.

use std::time::Duration;

use shepherd_types::{EventId, IngestRequest, IngestResponse};

use crate::error::AgentError;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How failed deliveries are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Sleep before the first retry; doubled for each one after.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (zero-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
            .min(MAX_BACKOFF)
    }
}

/// Posts raw lines to `{backend}/ingest`.
#[derive(Debug, Clone)]
pub struct IngestClient {
    http: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl IngestClient {
    pub fn new(backend: &str, retry: RetryPolicy, timeout: Duration) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/ingest", backend.trim_end_matches('/')),
            retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Delivers one line, retrying transport failures and 5xx answers with
    /// exponential backoff. A 4xx answer is returned immediately.
    pub async fn send_line(&self, line: &str) -> Result<EventId, AgentError> {
        let mut retry = 0;
        loop {
            match self.try_send(line).await {
                Ok(id) => return Ok(id),
                Err(e) if e.is_retryable() && retry < self.retry.max_retries => {
                    let backoff = self.retry.backoff(retry);
                    tracing::warn!(
                        attempt = retry + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "ingest failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_send(&self, line: &str) -> Result<EventId, AgentError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&IngestRequest {
                raw: line.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: IngestResponse = response.json().await?;
        Ok(body.id)
    }
}
