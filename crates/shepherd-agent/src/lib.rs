//! Line source for the Shepherd log monitor.
//!
//! Watches one log file and forwards every newly appended line to a
//! Shepherd server's `/ingest` endpoint. Filesystem notifications (via
//! [`notify`]) wake the reader; a periodic poll covers filesystems that do
//! not deliver them. Delivery failures are retried with backoff and then
//! logged; they never stop the agent.

pub mod cli;
pub mod client;
pub mod error;
pub mod tail;

pub use client::{IngestClient, RetryPolicy};
pub use error::AgentError;
pub use tail::LineTailer;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Counters for one agent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub sent: u64,
    pub failed: u64,
}

/// Tails a file and forwards its lines.
pub struct Agent {
    tailer: LineTailer,
    client: IngestClient,
    poll_interval: Duration,
}

impl Agent {
    pub fn new(tailer: LineTailer, client: IngestClient, poll_interval: Duration) -> Self {
        Self {
            tailer,
            client,
            poll_interval,
        }
    }

    /// Reads whatever is new and forwards it line by line, in file order.
    pub async fn forward_new_lines(&mut self) -> ForwardStats {
        let mut stats = ForwardStats::default();
        let lines = match self.tailer.read_new_lines().await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!("failed to read new lines: {}", e);
                return stats;
            }
        };

        for line in lines {
            match self.client.send_line(&line).await {
                Ok(id) => {
                    tracing::debug!(event_id = %id, "sent line");
                    stats.sent += 1;
                }
                Err(e) => {
                    tracing::error!(line = %line, "giving up on line: {}", e);
                    stats.failed += 1;
                }
            }
        }
        stats
    }

    /// Runs until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Watch`] if the file watcher cannot be started.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<ForwardStats, AgentError> {
        let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);
        let _watcher = watch_file(self.tailer.path(), wake_tx)?;

        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            path = %self.tailer.path().display(),
            backend = %self.client.endpoint(),
            "watching file"
        );

        let mut total = ForwardStats::default();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                Some(()) = wake_rx.recv() => {}
                _ = poll.tick() => {}
            }
            let stats = self.forward_new_lines().await;
            total.sent += stats.sent;
            total.failed += stats.failed;
        }

        tracing::info!(sent = total.sent, failed = total.failed, "agent stopped");
        Ok(total)
    }
}

/// Watches the file's parent directory and signals `wake` whenever an
/// event touches the file. Notifications coalesce: a pending wake-up is
/// enough to pick up every change.
fn watch_file(path: &Path, wake: mpsc::Sender<()>) -> Result<RecommendedWatcher, AgentError> {
    let target: PathBuf = path.file_name().map(PathBuf::from).unwrap_or_default();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                if event.paths.iter().any(|p| p.file_name() == Some(target.as_os_str())) {
                    let _ = wake.try_send(());
                }
            }
            Err(e) => tracing::warn!("file watch error: {}", e),
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
