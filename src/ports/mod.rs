//! Ports: interfaces between the application core and the outside world.
//!
//! The application layer depends only on these traits; adapters supply
//! the upstream-specific implementations.

pub mod job_directory;
pub mod log_sink;

pub use job_directory::{BuildSummary, DirectoryError, JobDirectory, JobSummary};
pub use log_sink::{BuildState, LogChunk, LogSink, SinkError};
