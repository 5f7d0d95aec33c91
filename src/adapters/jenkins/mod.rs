//! Jenkins REST API adapters.

pub mod client;
pub mod directory;
pub mod sink;

pub use client::{JenkinsClient, JenkinsConfig};
pub use directory::JenkinsJobDirectory;
pub use sink::JenkinsBuildLog;
