//! Per-session timing and sizing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::PtyConfig;
use crate::error::DriverError;

/// Timeouts and limits for one session.
///
/// Every read the engine performs is bounded by one of these values.
/// Durations (de)serialize as `{ "secs": .., "nanos": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default deadline for one command, queue wait included.
    pub command_timeout: Duration,

    /// Absolute bound on prompt resolution.
    pub prompt_timeout: Duration,

    /// Silence that ends a quiet read.
    pub quiet_period: Duration,

    /// Bound on the whole login handshake.
    pub handshake_timeout: Duration,

    /// Wait after entering a sub-shell that prints no banner.
    pub shell_settle: Duration,

    /// How long to keep reading for a prompt after a command timed out.
    pub recovery_window: Duration,

    /// Timeouts in a row after which the session is marked failed.
    pub max_consecutive_timeouts: u32,

    /// Bytes from the end of the buffer searched for prompts.
    pub search_depth: usize,

    /// Commands that may wait in the session queue.
    pub queue_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(30),
            prompt_timeout: Duration::from_secs(10),
            quiet_period: Duration::from_millis(500),
            handshake_timeout: Duration::from_secs(30),
            shell_settle: Duration::from_secs(1),
            recovery_window: Duration::from_secs(5),
            max_consecutive_timeouts: 3,
            search_depth: 1000,
            queue_depth: 32,
        }
    }
}

impl SessionConfig {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), DriverError> {
        let invalid = |message: &str| {
            Err(DriverError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if self.command_timeout.is_zero() {
            return invalid("command_timeout must be non-zero");
        }
        if self.prompt_timeout.is_zero() || self.handshake_timeout.is_zero() {
            return invalid("prompt_timeout and handshake_timeout must be non-zero");
        }
        if self.quiet_period.is_zero() || self.quiet_period > self.prompt_timeout {
            return invalid("quiet_period must be non-zero and at most prompt_timeout");
        }
        if self.search_depth == 0 {
            return invalid("search_depth must be non-zero");
        }
        if self.queue_depth == 0 {
            return invalid("queue_depth must be non-zero");
        }
        if self.max_consecutive_timeouts == 0 {
            return invalid("max_consecutive_timeouts must be non-zero");
        }
        Ok(())
    }

    pub(crate) fn pty_config(&self) -> PtyConfig {
        PtyConfig {
            search_depth: self.search_depth,
            quiet_period: self.quiet_period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        SessionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_queue_rejected() {
        let config = SessionConfig {
            queue_depth: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DriverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_quiet_period_bounded_by_prompt_timeout() {
        let config = SessionConfig {
            quiet_period: Duration::from_secs(20),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "command_timeout": { "secs": 5, "nanos": 0 }, "queue_depth": 4 }"#,
        )
        .unwrap();
        assert_eq!(config.command_timeout, Duration::from_secs(5));
        assert_eq!(config.queue_depth, 4);
        assert_eq!(config.shell_settle, Duration::from_secs(1));
    }

    #[test]
    fn test_json_round_trip() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
