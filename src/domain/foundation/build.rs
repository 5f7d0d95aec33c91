//! Value objects naming a build on the upstream CI server.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Name of a CI job (e.g. "backend-deploy").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    /// Creates a new JobName, returning error if empty.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("job_name"));
        }
        Ok(Self(name))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential number of a build within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildNumber(u32);

impl BuildNumber {
    /// Creates a new BuildNumber.
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the inner number.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BuildNumber {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

/// A specific build of a specific job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildRef {
    pub job: JobName,
    pub number: BuildNumber,
}

impl BuildRef {
    /// Creates a reference to one build of one job.
    pub fn new(job: JobName, number: BuildNumber) -> Self {
        Self { job, number }
    }
}

impl fmt::Display for BuildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' #{}", self.job, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_name_accepts_non_empty_string() {
        let name = JobName::new("backend-deploy").unwrap();
        assert_eq!(name.as_str(), "backend-deploy");
    }

    #[test]
    fn job_name_rejects_empty_string() {
        let result = JobName::new("");
        assert!(result.is_err());
        match result {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "job_name"),
            _ => panic!("Expected EmptyField error"),
        }
    }

    #[test]
    fn job_name_rejects_whitespace_only_string() {
        assert!(JobName::new("   ").is_err());
    }

    #[test]
    fn build_number_displays_as_plain_number() {
        let number = BuildNumber::new(42);
        assert_eq!(format!("{}", number), "42");
        assert_eq!(number.as_u32(), 42);
    }

    #[test]
    fn build_ref_displays_job_and_number() {
        let build = BuildRef::new(JobName::new("web").unwrap(), BuildNumber::new(7));
        assert_eq!(format!("{}", build), "'web' #7");
    }

    #[test]
    fn build_ref_equality_covers_both_fields() {
        let a = BuildRef::new(JobName::new("web").unwrap(), BuildNumber::new(7));
        let b = BuildRef::new(JobName::new("web").unwrap(), BuildNumber::new(7));
        let c = BuildRef::new(JobName::new("web").unwrap(), BuildNumber::new(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
