//! Logging initialization for pairhub.
//!
//! Console output is always enabled; a log file is added when the configured
//! path can be created. `RUST_LOG` takes precedence over the configured level.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Build the filter: the relay's own events at `level`, HTTP plumbing at warn.
fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = parse_level(level).as_str().to_lowercase();
    EnvFilter::new(format!("warn,pairhub={level},tower_http={level}"))
}

/// Initialize logging to both stdout and the configured log file.
///
/// The log file is appended to, so restarts keep earlier sessions.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;
    let writer = std::io::stdout.and(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging.
///
/// Used when the log file cannot be opened.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(build_filter(level))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level(" info "), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("Error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_default() {
        assert_eq!(parse_level("verbose"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_build_filter_mentions_crate() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let filter = build_filter("debug").to_string();
        assert!(filter.contains("pairhub=debug"));
    }
}
