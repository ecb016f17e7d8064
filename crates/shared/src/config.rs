//! Configuration management for the MAL fetch engine.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings
    pub logging: LoggingConfig,

    /// HTTP fetcher settings
    pub fetcher: FetcherConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory path (relative to the working directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Which host the fetcher talks to.
///
/// A mirror is a self-hosted proxy of MyAnimeList. Its 503 responses usually
/// mean a deploy or cold start, so they are retried with a long delay; the
/// original site's 503s are not retried at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    #[default]
    Original,
    Mirror,
}

/// Delay between retries, in milliseconds.
///
/// In TOML either a single integer (`retry_delay = 1500`) or a
/// `[min, max]` pair (`retry_delay = [2000, 4000]`) drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetryDelay {
    Fixed(u64),
    Range(u64, u64),
}

impl Default for RetryDelay {
    fn default() -> Self {
        RetryDelay::Range(2000, 4000)
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of requests in flight at once
    pub max_concurrent: usize,

    /// Maximum pending + running requests (None = unbounded)
    pub max_queue_depth: Option<usize>,

    /// Log every finished request
    pub log_http: bool,

    /// Original site or self-hosted mirror
    pub endpoint: EndpointKind,

    /// Delay policy between retries
    pub retry_delay: RetryDelay,

    /// Maximum retries for retryable failures
    pub max_retries: u32,

    /// Per-attempt HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// Optional User-Agent header
    pub user_agent: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 20,
            max_queue_depth: None,
            log_http: true,
            endpoint: EndpointKind::Original,
            retry_delay: RetryDelay::default(),
            max_retries: 5,
            request_timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl FetcherConfig {
    /// Reject values the fetcher cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            bail!("fetcher.max_concurrent must be at least 1");
        }
        if self.max_queue_depth == Some(0) {
            bail!("fetcher.max_queue_depth must be at least 1 when set");
        }
        if let RetryDelay::Range(min, max) = self.retry_delay {
            if min > max {
                bail!("fetcher.retry_delay range is inverted: [{}, {}]", min, max);
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a TOML file or fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.fetcher.validate()
    }
}
