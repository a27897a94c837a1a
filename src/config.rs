//! Configuration module for pairhub.

use serde::Deserialize;
use std::path::Path;

use crate::{PairhubError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// HTTP path that accepts WebSocket upgrades.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/comm".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Number of pending outbound messages a session may hold before it is
    /// treated as a slow peer and disconnected.
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
}

fn default_outbound_queue_capacity() -> usize {
    256
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: default_outbound_queue_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/pairhub.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Relay configuration.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(PairhubError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PairhubError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PAIRHUB_HOST`: Override the bind host
    /// - `PAIRHUB_PORT`: Override the bind port
    /// - `PAIRHUB_LOG_LEVEL`: Override the log level
    ///
    /// Empty values, and ports that do not parse, are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PAIRHUB_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }

        if let Ok(port) = std::env::var("PAIRHUB_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(level) = std::env::var("PAIRHUB_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The outbound queue capacity is zero
    /// - The WebSocket path does not start with `/`
    pub fn validate(&self) -> Result<()> {
        if self.relay.outbound_queue_capacity == 0 {
            return Err(PairhubError::Validation(
                "relay.outbound_queue_capacity must be at least 1".to_string(),
            ));
        }
        if !self.server.path.starts_with('/') {
            return Err(PairhubError::Validation(format!(
                "server.path must start with '/', got {:?}",
                self.server.path
            )));
        }
        Ok(())
    }
}
