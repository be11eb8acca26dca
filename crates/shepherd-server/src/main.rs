//! Shepherd server binary.
//!
//! Loads `shepherd.toml` (or the file named on the command line or in
//! `SHEPHERD_CONFIG_PATH`), then serves ingestion, acknowledgement and the
//! live `/ws` stream until SIGINT or SIGTERM. Nothing is persisted: each run
//! starts with an empty ledger and no subscribers.

use shepherd_server::config::{self, Config, LoggingConfig};
use shepherd_server::{app, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "shepherd.toml";

/// Where the configuration path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigOrigin {
    Argument,
    Environment,
    Default,
}

/// The first argument wins over the environment; blank values are ignored.
fn choose_config_path(arg: Option<String>, env: Option<String>) -> (String, ConfigOrigin) {
    let non_blank = |value: &String| !value.trim().is_empty();

    if let Some(path) = arg.filter(non_blank) {
        (path, ConfigOrigin::Argument)
    } else if let Some(path) = env.filter(non_blank) {
        (path, ConfigOrigin::Environment)
    } else {
        (DEFAULT_CONFIG_PATH.to_string(), ConfigOrigin::Default)
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn log_startup(config: &Config, config_path: &str, origin: ConfigOrigin, state: &AppState) {
    let ping = config
        .websocket
        .ping_interval()
        .map_or_else(|| "off".to_string(), |d| format!("{}s", d.as_secs()));
    let ledger_events = state.hub.events().map(|events| events.len()).unwrap_or(0);

    tracing::info!(path = config_path, origin = ?origin, "loaded configuration");
    tracing::info!(
        channel_capacity = config.websocket.channel_capacity,
        ping = %ping,
        "websocket subscribers: frames beyond the buffer disconnect the viewer"
    );
    tracing::info!(ledger_events, "event ledger is in-memory and starts empty");
}

#[tokio::main]
async fn main() {
    let (config_path, origin) = choose_config_path(
        std::env::args().nth(1),
        std::env::var("SHEPHERD_CONFIG_PATH").ok(),
    );
    let config = config::load_config(Some(config_path.as_str()))
        .unwrap_or_else(|e| panic!("invalid configuration in {config_path}: {e}"));

    init_tracing(&config.logging);

    let state = AppState::new(config.websocket.clone());
    log_startup(&config, &config_path, origin, &state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("cannot listen on {addr}: {e}"));
    tracing::info!(%addr, "shepherd server listening");

    let hub = state.hub.clone();
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let signal = stop_signal().await;
        tracing::info!(signal, "stopping; live subscribers will be disconnected");
    })
    .await
    .expect("server error");

    tracing::info!(
        events = hub.events().map(|events| events.len()).unwrap_or(0),
        subscribers = hub.registry().len(),
        "shepherd server stopped; ledger discarded"
    );
}

/// Resolves with the name of the first stop signal received.
async fn stop_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("cannot listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
