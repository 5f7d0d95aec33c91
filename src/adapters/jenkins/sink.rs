//! Jenkins-backed log sink.
//!
//! Build metadata comes from the build's `api/json` endpoint and console
//! text from `consoleText`. Jenkins serves the whole console on every
//! request, so reads fetch the full text and slice it at the caller's
//! offset; the returned `total_len` lets the caller detect truncation.

use async_trait::async_trait;

use crate::domain::foundation::BuildRef;
use crate::ports::{BuildState, LogChunk, LogSink, SinkError};

use super::client::JenkinsClient;

/// `LogSink` implementation over the Jenkins REST API.
pub struct JenkinsBuildLog {
    client: JenkinsClient,
}

impl JenkinsBuildLog {
    pub fn new(client: JenkinsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogSink for JenkinsBuildLog {
    async fn build_state(&self, build: &BuildRef) -> Result<BuildState, SinkError> {
        let url = self.client.build_url(build);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;
        let response = check_status(response, build)?;

        let info: BuildInfoPayload = response
            .json()
            .await
            .map_err(|err| SinkError::Gone(format!("unexpected build payload: {}", err)))?;

        if info.building {
            Ok(BuildState::Running)
        } else {
            Ok(BuildState::Finished {
                result: info.result,
            })
        }
    }

    async fn read_from(&self, build: &BuildRef, offset: u64) -> Result<LogChunk, SinkError> {
        let url = self.client.console_url(build);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;
        let response = check_status(response, build)?;

        let text = response
            .text()
            .await
            .map_err(|err| transport_error(&err))?;
        let total_len = text.len() as u64;
        let start = (offset as usize).min(text.len());
        let data = text.get(start..).unwrap_or_default().to_string();

        Ok(LogChunk { data, total_len })
    }
}

/// Maps HTTP status codes onto the sink error taxonomy. Missing builds
/// are refusals, server hiccups are retryable, everything else is final.
fn check_status(
    response: reqwest::Response,
    build: &BuildRef,
) -> Result<reqwest::Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status.as_u16() {
        404 => Err(SinkError::NotFound(build.clone())),
        429 | 500..=599 => Err(SinkError::Transient(format!("jenkins returned {}", status))),
        _ => Err(SinkError::Gone(format!("jenkins returned {}", status))),
    }
}

/// Maps transport failures. Timeouts and refused connections heal on
/// their own; anything else will not.
fn transport_error(err: &reqwest::Error) -> SinkError {
    if err.is_timeout() || err.is_connect() {
        SinkError::Transient(err.to_string())
    } else {
        SinkError::Gone(err.to_string())
    }
}

// ----- Jenkins API Types -----

#[derive(Debug, serde::Deserialize)]
struct BuildInfoPayload {
    #[serde(default)]
    building: bool,
    result: Option<String>,
}
