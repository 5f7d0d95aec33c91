//! Shared HTTP plumbing for the Jenkins REST API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = JenkinsConfig::new("https://ci.example.com")
//!     .with_credentials("admin", api_token)
//!     .with_timeout(Duration::from_secs(10));
//!
//! let client = JenkinsClient::new(config);
//! ```
//!
//! Credentials are optional; an open Jenkins works without them. The API
//! token is held behind `Secret` so it never shows up in debug output.

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

use crate::domain::foundation::BuildRef;

/// Tree expression limiting the jobs listing to the fields we relay.
const JOBS_TREE_QUERY: &str = "jobs[name,url,color,lastBuild[number,url]]";

/// Configuration for talking to one Jenkins controller.
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    /// Root URL of the controller, without a trailing slash.
    pub base_url: String,
    /// Username for basic auth, if the controller requires it.
    pub username: Option<String>,
    /// API token paired with the username.
    api_token: Option<Secret<String>>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl JenkinsConfig {
    /// Creates a configuration for an unauthenticated controller.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            username: None,
            api_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets basic auth credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.api_token = Some(Secret::new(api_token.into()));
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the credentials pair when both halves are configured.
    fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.api_token) {
            (Some(username), Some(token)) => Some((username, token.expose_secret())),
            _ => None,
        }
    }
}

/// Thin wrapper around `reqwest::Client` that knows Jenkins URL shapes
/// and applies credentials to every request.
#[derive(Clone)]
pub struct JenkinsClient {
    config: JenkinsConfig,
    client: Client,
}

impl JenkinsClient {
    /// Creates a client with the given configuration.
    pub fn new(config: JenkinsConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Jobs listing endpoint, trimmed down by a tree query.
    pub(super) fn jobs_url(&self) -> String {
        format!(
            "{}/api/json?tree={}",
            self.config.base_url, JOBS_TREE_QUERY
        )
    }

    /// Metadata endpoint for one build.
    pub(super) fn build_url(&self, build: &BuildRef) -> String {
        format!(
            "{}/job/{}/{}/api/json",
            self.config.base_url,
            build.job.as_str(),
            build.number
        )
    }

    /// Full console text endpoint for one build.
    pub(super) fn console_url(&self, build: &BuildRef) -> String {
        format!(
            "{}/job/{}/{}/consoleText",
            self.config.base_url,
            build.job.as_str(),
            build.number
        )
    }

    /// Starts a GET request with credentials applied.
    pub(super) fn get(&self, url: String) -> RequestBuilder {
        let request = self.client.get(url);
        match self.config.credentials() {
            Some((username, token)) => request.basic_auth(username, Some(token)),
            None => request,
        }
    }
}
