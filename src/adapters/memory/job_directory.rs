//! In-memory job directory for tests and local development.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{DirectoryError, JobDirectory, JobSummary};

/// JobDirectory backed by a process-local list.
pub struct InMemoryJobDirectory {
    jobs: RwLock<Vec<JobSummary>>,
    unavailable: RwLock<Option<String>>,
}

impl InMemoryJobDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(Vec::new()),
            unavailable: RwLock::new(None),
        }
    }

    // === Test Helpers ===

    /// Adds a job to the listing.
    pub async fn push_job(&self, job: JobSummary) {
        self.jobs.write().await.push(job);
    }

    /// Makes every subsequent listing fail with the given reason.
    pub async fn set_unavailable(&self, reason: &str) {
        *self.unavailable.write().await = Some(reason.to_string());
    }
}

impl Default for InMemoryJobDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobDirectory for InMemoryJobDirectory {
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, DirectoryError> {
        if let Some(reason) = self.unavailable.read().await.as_deref() {
            return Err(DirectoryError::Unavailable(reason.to_string()));
        }
        Ok(self.jobs.read().await.clone())
    }
}
