//! Shepherd agent binary.
//!
//! Tails one log file and forwards new lines until Ctrl+C.

use clap::Parser;
use shepherd_agent::cli::AgentArgs;
use shepherd_agent::{Agent, IngestClient, LineTailer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = AgentArgs::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(args).await {
        tracing::error!("agent failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: AgentArgs) -> Result<(), shepherd_agent::AgentError> {
    let client = IngestClient::new(&args.backend, args.retry_policy(), args.request_timeout())?;
    let tailer = LineTailer::open(&args.file, args.from_start).await?;

    Agent::new(tailer, client, args.poll_interval())
        .run(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("received SIGINT, stopping");
}
