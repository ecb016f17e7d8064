//! Logging infrastructure for the MAL fetch engine.
//!
//! This module provides structured logging with optional file rotation and
//! module-specific log levels.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log directory path
    pub log_dir: String,
    /// Component name (used for log file naming)
    pub component: String,
    /// Default log level
    pub default_level: Level,
    /// Enable console output
    pub console: bool,
    /// Enable file output
    pub file: bool,
    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            component: "mal-fetch".to_string(),
            default_level: Level::INFO,
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Build a logging setup from the `[logging]` config section.
    ///
    /// Unknown level names fall back to INFO.
    pub fn from_config(config: &LoggingConfig, component: &str) -> Self {
        let default_level = config.default_level.parse().unwrap_or(Level::INFO);

        Self {
            log_dir: config.log_dir.clone(),
            component: component.to_string(),
            default_level,
            console: config.console,
            file: config.file,
            json_format: config.json_format,
        }
    }

    fn filter_directives(&self) -> String {
        let crate_target = self.component.replace('-', "_");
        format!(
            "{}={},shared={},hyper=warn,reqwest=warn,h2=warn,html5ever=warn,selectors=warn",
            crate_target, self.default_level, self.default_level
        )
    }
}

/// Initialize logging with the given configuration
///
/// Sets up tracing with:
/// - Console output (human-readable)
/// - Optional daily-rotated file output, plain or JSON
/// - Module-specific log levels, overridable through `RUST_LOG`
pub fn init(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let mut layers = Vec::new();

    if config.console {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(std::io::stderr)
            .boxed();
        layers.push(console_layer);
    }

    if config.file {
        let log_dir = Path::new(&config.log_dir);
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", config.log_dir))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, &config.component);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_level(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(file_appender)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(file_appender)
                .boxed()
        };

        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(
        component = %config.component,
        file = config.file,
        log_dir = %config.log_dir,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config() {
        let config = LogConfig::default();
        assert_eq!(config.component, "mal-fetch");
        assert_eq!(config.default_level, Level::INFO);
        assert!(config.console);
        assert!(!config.file);
    }

    #[test]
    fn test_from_config_parses_level() {
        let section = LoggingConfig {
            default_level: "debug".to_string(),
            file: true,
            ..Default::default()
        };
        let config = LogConfig::from_config(&section, "mal-fetch");
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.file);

        let section = LoggingConfig {
            default_level: "chatty".to_string(),
            ..Default::default()
        };
        assert_eq!(
            LogConfig::from_config(&section, "mal-fetch").default_level,
            Level::INFO
        );
    }

    #[test]
    fn test_filter_directives_use_crate_target() {
        let config = LogConfig {
            default_level: Level::WARN,
            ..Default::default()
        };
        let directives = config.filter_directives();
        assert!(directives.starts_with("mal_fetch=WARN"));
        assert!(directives.contains("reqwest=warn"));
    }
}
