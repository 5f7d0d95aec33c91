//! Jenkins-backed job directory.
//!
//! One call to the controller's `api/json` with a tree query that trims
//! the response to the fields the dashboard shows.

use async_trait::async_trait;

use crate::domain::foundation::BuildNumber;
use crate::ports::{BuildSummary, DirectoryError, JobDirectory, JobSummary};

use super::client::JenkinsClient;

/// `JobDirectory` implementation over the Jenkins REST API.
pub struct JenkinsJobDirectory {
    client: JenkinsClient,
}

impl JenkinsJobDirectory {
    pub fn new(client: JenkinsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobDirectory for JenkinsJobDirectory {
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, DirectoryError> {
        let url = self.client.jobs_url();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DirectoryError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Unavailable(format!(
                "jenkins returned {}",
                status
            )));
        }

        let payload: JobsPayload = response.json().await.map_err(|err| {
            DirectoryError::Unavailable(format!("unexpected jobs payload: {}", err))
        })?;

        Ok(payload.jobs.into_iter().map(JobSummary::from).collect())
    }
}

// ----- Jenkins API Types -----

#[derive(Debug, serde::Deserialize)]
struct JobsPayload {
    #[serde(default)]
    jobs: Vec<JobPayload>,
}

#[derive(Debug, serde::Deserialize)]
struct JobPayload {
    name: String,
    url: Option<String>,
    color: Option<String>,
    #[serde(rename = "lastBuild")]
    last_build: Option<BuildPayload>,
}

#[derive(Debug, serde::Deserialize)]
struct BuildPayload {
    number: u32,
    url: Option<String>,
}

impl From<JobPayload> for JobSummary {
    fn from(payload: JobPayload) -> Self {
        Self {
            name: payload.name,
            url: payload.url,
            color: payload.color,
            last_build: payload.last_build.map(|build| BuildSummary {
                number: BuildNumber::from(build.number),
                url: build.url,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_jobs_listing() {
        let raw = r#"{
            "jobs": [
                {
                    "name": "web",
                    "url": "https://ci.example.com/job/web/",
                    "color": "blue",
                    "lastBuild": {"number": 42, "url": "https://ci.example.com/job/web/42/"}
                },
                {
                    "name": "nightly",
                    "url": "https://ci.example.com/job/nightly/",
                    "color": "grey",
                    "lastBuild": null
                }
            ]
        }"#;

        let payload: JobsPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.jobs.len(), 2);

        let jobs: Vec<JobSummary> = payload.jobs.into_iter().map(JobSummary::from).collect();
        assert_eq!(jobs[0].name, "web");
        assert_eq!(jobs[0].color.as_deref(), Some("blue"));
        let last = jobs[0].last_build.as_ref().unwrap();
        assert_eq!(last.number.as_u32(), 42);
        assert!(jobs[1].last_build.is_none());
    }

    #[test]
    fn tolerates_sparse_job_entries() {
        let raw = r#"{"jobs": [{"name": "bare"}]}"#;
        let payload: JobsPayload = serde_json::from_str(raw).unwrap();

        let job = JobSummary::from(payload.jobs.into_iter().next().unwrap());
        assert_eq!(job.name, "bare");
        assert_eq!(job.url, None);
        assert_eq!(job.color, None);
        assert!(job.last_build.is_none());
    }

    #[test]
    fn empty_listing_parses_to_no_jobs() {
        let payload: JobsPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.jobs.is_empty());
    }
}
