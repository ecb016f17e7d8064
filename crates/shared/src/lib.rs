//! Shared library for the MAL fetch workspace.
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;

// Re-export commonly used types
pub use config::{Config, EndpointKind, FetcherConfig, LoggingConfig, RetryDelay};
pub use logging::LogConfig;
