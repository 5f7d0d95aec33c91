//! Log streaming configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Session worker and channel tuning
#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    /// Pause between sink polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Buffered messages per session before the worker waits
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Transient failures tolerated per read before giving up
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// First retry delay in milliseconds
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,

    /// Backoff growth factor between retries
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: u32,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,
}

impl StreamingConfig {
    /// Get the poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get the initial retry backoff as Duration
    pub fn retry_initial_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_initial_backoff_ms)
    }

    /// Get the retry backoff ceiling as Duration
    pub fn retry_max_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_max_backoff_ms)
    }

    /// Validate streaming configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        if self.retry_multiplier == 0 {
            return Err(ValidationError::InvalidRetryPolicy);
        }
        Ok(())
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            channel_capacity: default_channel_capacity(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            retry_multiplier: default_retry_multiplier(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_channel_capacity() -> usize {
    256
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_initial_backoff_ms() -> u64 {
    500
}

fn default_retry_multiplier() -> u32 {
    2
}

fn default_retry_max_backoff_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_patient_dashboard() {
        let config = StreamingConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.channel_capacity, 256);
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.retry_initial_backoff(), Duration::from_millis(500));
        assert_eq!(config.retry_max_backoff(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let config = StreamingConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPollInterval)
        ));
    }

    #[test]
    fn zero_capacity_fails_validation() {
        let config = StreamingConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidChannelCapacity)
        ));
    }

    #[test]
    fn zero_multiplier_fails_validation() {
        let config = StreamingConfig {
            retry_multiplier: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRetryPolicy)
        ));
    }
}
