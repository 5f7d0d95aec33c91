//! Wire DTOs for the REST endpoints.
//!
//! The jobs payload mirrors the upstream listing field for field; the
//! dashboard consumes it as-is. Missing colors come back as `"grey"` and
//! absent values serialize as `null` rather than being dropped.

use serde::Serialize;

use crate::ports::{BuildSummary, JobSummary};

/// Body of `GET /api/jobs` on success.
#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobView>,
}

impl JobsResponse {
    pub fn from_summaries(summaries: Vec<JobSummary>) -> Self {
        Self {
            jobs: summaries.into_iter().map(JobView::from).collect(),
        }
    }
}

/// One job row in the listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub name: String,
    pub url: Option<String>,
    pub color: String,
    pub last_build: Option<BuildView>,
}

/// Reference to a job's most recent build.
#[derive(Debug, Serialize)]
pub struct BuildView {
    pub number: u32,
    pub url: Option<String>,
}

impl From<JobSummary> for JobView {
    fn from(summary: JobSummary) -> Self {
        Self {
            name: summary.name,
            url: summary.url,
            color: summary.color.unwrap_or_else(|| "grey".to_string()),
            last_build: summary.last_build.map(BuildView::from),
        }
    }
}

impl From<BuildSummary> for BuildView {
    fn from(build: BuildSummary) -> Self {
        Self {
            number: build.number.as_u32(),
            url: build.url,
        }
    }
}

/// Body of `GET /api/jobs` when the upstream is unreachable. Delivered
/// with HTTP 200; the dashboard looks at the `error` key.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub active_sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::BuildNumber;

    #[test]
    fn job_view_defaults_missing_color_to_grey() {
        let view = JobView::from(JobSummary {
            name: "web".to_string(),
            url: None,
            color: None,
            last_build: None,
        });

        assert_eq!(view.color, "grey");
    }

    #[test]
    fn job_view_serializes_with_camel_case_last_build() {
        let view = JobView::from(JobSummary {
            name: "web".to_string(),
            url: Some("https://ci.example.com/job/web/".to_string()),
            color: Some("blue".to_string()),
            last_build: Some(BuildSummary {
                number: BuildNumber::new(42),
                url: None,
            }),
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["color"], "blue");
        assert_eq!(json["lastBuild"]["number"], 42);
        assert!(json["lastBuild"]["url"].is_null());
    }

    #[test]
    fn absent_last_build_serializes_as_null() {
        let response = JobsResponse::from_summaries(vec![JobSummary {
            name: "idle".to_string(),
            url: None,
            color: Some("grey".to_string()),
            last_build: None,
        }]);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["jobs"][0]["lastBuild"].is_null());
        assert!(json["jobs"][0]["url"].is_null());
    }
}
