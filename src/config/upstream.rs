//! Upstream CI controller configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upstream Jenkins-style controller configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Root URL of the controller
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Username for basic auth
    pub username: Option<String>,

    /// API token paired with the username. Kept as a plain string here;
    /// the adapter wraps it in `Secret` before use.
    pub api_token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if both credential halves are present
    pub fn has_credentials(&self) -> bool {
        self.username.as_ref().is_some_and(|u| !u.is_empty())
            && self.api_token.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Validate upstream configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUpstreamUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        // Half-configured credentials are a deployment mistake, not an
        // anonymous setup.
        match (&self.username, &self.api_token) {
            (Some(_), None) => Err(ValidationError::MissingRequired("UPSTREAM__API_TOKEN")),
            (None, Some(_)) => Err(ValidationError::MissingRequired("UPSTREAM__USERNAME")),
            _ => Ok(()),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            api_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    10
}
