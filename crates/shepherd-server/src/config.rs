//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Live viewer connection settings.
    #[serde(default)]
    pub websocket: WebSocketConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Per-connection settings for streaming subscribers.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Frames buffered per subscriber before it is considered too slow and
    /// dropped.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Seconds between ping frames sent to each viewer. `0` disables pings.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

impl WebSocketConfig {
    pub fn ping_interval(&self) -> Option<Duration> {
        (self.ping_interval_secs > 0).then(|| Duration::from_secs(self.ping_interval_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "shepherd_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_channel_capacity() -> usize {
    256
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SHEPHERD_HOST` overrides `server.host`
/// - `SHEPHERD_PORT` overrides `server.port`
/// - `SHEPHERD_WS_CHANNEL_CAPACITY` overrides `websocket.channel_capacity`
/// - `SHEPHERD_WS_PING_INTERVAL_SECS` overrides `websocket.ping_interval_secs`
/// - `SHEPHERD_LOG_LEVEL` overrides `logging.level`
/// - `SHEPHERD_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("SHEPHERD_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("SHEPHERD_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(capacity) = var("SHEPHERD_WS_CHANNEL_CAPACITY") {
        if let Ok(parsed) = capacity.parse() {
            config.websocket.channel_capacity = parsed;
        }
    }
    if let Some(secs) = var("SHEPHERD_WS_PING_INTERVAL_SECS") {
        if let Ok(parsed) = secs.parse() {
            config.websocket.ping_interval_secs = parsed;
        }
    }
    if let Some(level) = var("SHEPHERD_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("SHEPHERD_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
