//! In-memory adapters: deterministic port implementations for tests
//! and local development.

mod build_log;
mod job_directory;

pub use build_log::InMemoryBuildLog;
pub use job_directory::InMemoryJobDirectory;
