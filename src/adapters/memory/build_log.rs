//! In-memory log sink for tests and local development.
//!
//! Deterministic stand-in for the upstream CI server: tests script the
//! build's console text, its terminal state, and injected failures.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;

use crate::domain::foundation::BuildRef;
use crate::ports::{BuildState, LogChunk, LogSink, SinkError};

#[derive(Debug, Clone)]
struct BuildRecord {
    text: String,
    state: BuildState,
    gone: bool,
}

impl BuildRecord {
    fn running() -> Self {
        Self {
            text: String::new(),
            state: BuildState::Running,
            gone: false,
        }
    }
}

/// LogSink backed by a process-local map.
pub struct InMemoryBuildLog {
    builds: RwLock<HashMap<BuildRef, BuildRecord>>,
    transient_failures: AtomicU32,
}

impl InMemoryBuildLog {
    /// Creates an empty sink with no builds.
    pub fn new() -> Self {
        Self {
            builds: RwLock::new(HashMap::new()),
            transient_failures: AtomicU32::new(0),
        }
    }

    // === Test Helpers ===

    /// Registers a running build with empty console text.
    pub async fn insert_running(&self, build: BuildRef) {
        self.builds
            .write()
            .await
            .insert(build, BuildRecord::running());
    }

    /// Appends one line of console text, adding the terminator.
    /// Creates the build as running if it does not exist yet.
    pub async fn append_line(&self, build: &BuildRef, line: &str) {
        let mut builds = self.builds.write().await;
        let record = builds
            .entry(build.clone())
            .or_insert_with(BuildRecord::running);
        record.text.push_str(line);
        record.text.push('\n');
    }

    /// Appends raw text without adding a terminator.
    pub async fn append_text(&self, build: &BuildRef, text: &str) {
        let mut builds = self.builds.write().await;
        let record = builds
            .entry(build.clone())
            .or_insert_with(BuildRecord::running);
        record.text.push_str(text);
    }

    /// Marks the build finished with an optional upstream result.
    pub async fn finish(&self, build: &BuildRef, result: Option<&str>) {
        if let Some(record) = self.builds.write().await.get_mut(build) {
            record.state = BuildState::Finished {
                result: result.map(str::to_string),
            };
        }
    }

    /// Makes every subsequent access to the build fail permanently.
    pub async fn mark_gone(&self, build: &BuildRef) {
        self.builds
            .write()
            .await
            .entry(build.clone())
            .and_modify(|record| record.gone = true)
            .or_insert_with(|| {
                let mut record = BuildRecord::running();
                record.gone = true;
                record
            });
    }

    /// Deletes the build entirely; later accesses see `NotFound`.
    pub async fn remove(&self, build: &BuildRef) {
        self.builds.write().await.remove(build);
    }

    /// Injects `count` transient failures into the next reads.
    pub fn fail_next_reads(&self, count: u32) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// Console text length in bytes, for test assertions.
    pub async fn text_len(&self, build: &BuildRef) -> Option<u64> {
        self.builds
            .read()
            .await
            .get(build)
            .map(|record| record.text.len() as u64)
    }

    fn take_transient_failure(&self) -> bool {
        self.transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryBuildLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for InMemoryBuildLog {
    async fn build_state(&self, build: &BuildRef) -> Result<BuildState, SinkError> {
        let builds = self.builds.read().await;
        let record = builds
            .get(build)
            .ok_or_else(|| SinkError::NotFound(build.clone()))?;
        if record.gone {
            return Err(SinkError::Gone("build log removed".into()));
        }
        Ok(record.state.clone())
    }

    async fn read_from(&self, build: &BuildRef, offset: u64) -> Result<LogChunk, SinkError> {
        if self.take_transient_failure() {
            return Err(SinkError::Transient("injected failure".into()));
        }

        let builds = self.builds.read().await;
        let record = builds
            .get(build)
            .ok_or_else(|| SinkError::NotFound(build.clone()))?;
        if record.gone {
            return Err(SinkError::Gone("build log removed".into()));
        }

        let total_len = record.text.len() as u64;
        let start = (offset as usize).min(record.text.len());
        let data = record.text.get(start..).unwrap_or_default().to_string();
        Ok(LogChunk { data, total_len })
    }
}
