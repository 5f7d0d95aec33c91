//! JobDirectory port - listing of jobs known to the upstream CI server.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::BuildNumber;

/// Most recent build of a job, as reported by the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub number: BuildNumber,
    pub url: Option<String>,
}

/// One job as reported by the upstream directory.
///
/// Names are kept as raw strings here; the listing is a display-only relay
/// and must not drop entries the upstream chose to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub name: String,
    pub url: Option<String>,

    /// Upstream status color (e.g. "blue", "red", "blue_anime").
    /// Absent when the upstream omits it.
    pub color: Option<String>,

    pub last_build: Option<BuildSummary>,
}

/// Directory failures. The listing endpoint reports these in-band.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("job directory unavailable: {0}")]
    Unavailable(String),
}

/// Port for listing jobs and their latest builds.
#[async_trait]
pub trait JobDirectory: Send + Sync {
    /// Lists all jobs with their latest build, if any.
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, DirectoryError>;
}
