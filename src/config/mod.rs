//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables through the
//! `config` and `dotenvy` crates. Variables carry the `BUILDWATCH` prefix
//! and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use buildwatch::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Listening on {}", config.server.socket_addr());
//! ```

mod error;
mod server;
mod streaming;
mod upstream;

pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use streaming::StreamingConfig;
pub use upstream::UpstreamConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has working defaults, so a bare environment starts a
/// server against a local controller. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (bind address, environment, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream CI controller (base URL, credentials)
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Session worker tuning (poll interval, channel capacity, retry)
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `BUILDWATCH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `BUILDWATCH__SERVER__PORT=8000` -> `server.port = 8000`
    /// - `BUILDWATCH__UPSTREAM__BASE_URL=...` -> `upstream.base_url = ...`
    /// - `BUILDWATCH__STREAMING__POLL_INTERVAL_MS=500` -> `streaming.poll_interval_ms = 500`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed into its
    /// expected type.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BUILDWATCH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.upstream.validate()?;
        self.streaming.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
