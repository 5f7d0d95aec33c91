//! LogSink port - read access to a build's console output.
//!
//! The sink hides where console text comes from (a Jenkins server, a file,
//! an in-memory fixture). Reads are offset-based: callers own their cursor
//! and the sink never tracks per-client positions.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::BuildRef;

/// A slice of console text starting at a requested byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChunk {
    /// Raw console text from the requested offset to the current end.
    /// Empty when nothing new has been written.
    pub data: String,

    /// Total length of the console text, in bytes, at read time.
    pub total_len: u64,
}

/// Whether the upstream build is still producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Running,

    /// Terminal. `result` carries the upstream verdict when it reports
    /// one (e.g. "SUCCESS", "FAILURE", "ABORTED").
    Finished { result: Option<String> },
}

impl BuildState {
    /// True while the build may still append output.
    pub fn is_running(&self) -> bool {
        matches!(self, BuildState::Running)
    }
}

/// Sink failures, classified by how the caller must react.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// The build does not exist upstream. Sessions are refused at open.
    #[error("build {0} not found")]
    NotFound(BuildRef),

    /// Temporary read failure. Retried with backoff before being
    /// promoted to a permanent one.
    #[error("log sink temporarily unavailable: {0}")]
    Transient(String),

    /// Permanent failure. The session ends with a single error event.
    #[error("log sink gone: {0}")]
    Gone(String),
}

impl SinkError {
    /// True if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SinkError::Transient(_))
    }
}

/// Port for reading a build's console output.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Reports whether the build exists and whether it is still running.
    async fn build_state(&self, build: &BuildRef) -> Result<BuildState, SinkError>;

    /// Reads console text from `offset` to the current end.
    ///
    /// The reported `total_len` can fall below a previously handed-out
    /// offset if the upstream log was truncated or rotated; callers must
    /// treat that as a permanent failure rather than re-reading.
    async fn read_from(&self, build: &BuildRef, offset: u64) -> Result<LogChunk, SinkError>;
}
