//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Upstream base URL must start with http:// or https://")]
    InvalidUpstreamUrl,

    #[error("Poll interval must be at least 1ms")]
    InvalidPollInterval,

    #[error("Channel capacity must be at least 1")]
    InvalidChannelCapacity,

    #[error("Retry multiplier must be at least 1")]
    InvalidRetryPolicy,
}
