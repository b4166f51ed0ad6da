//! # Connection Options
//!
//! Tunables for backoff, heartbeat and the outbound queue.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::ConnectionError;

/// Connection configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Base backoff delay for the first reconnect attempt.
    pub backoff_base_ms: u64,

    /// Upper bound of the uniform jitter added to every delay.
    pub backoff_jitter_ms: u64,

    /// Maximum delay between attempts.
    pub backoff_cap_ms: u64,

    /// Reconnect attempts before giving up.
    pub max_attempts: u32,

    /// Interval between heartbeat pings.
    pub heartbeat_interval_ms: u64,

    /// Time allowed for any inbound traffic after a ping.
    pub heartbeat_timeout_ms: u64,

    /// Capacity of the per-session outbound frame queue.
    pub outbound_capacity: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            backoff_base_ms: 1_000,
            backoff_jitter_ms: 2_000,
            backoff_cap_ms: 30_000,
            max_attempts: 5,
            heartbeat_interval_ms: 25_000,
            heartbeat_timeout_ms: 10_000,
            outbound_capacity: 64,
        }
    }
}

impl ConnectionOptions {
    /// Short timers and no jitter, for deterministic tests.
    pub fn for_testing() -> Self {
        Self {
            backoff_base_ms: 100,
            backoff_jitter_ms: 0,
            backoff_cap_ms: 1_000,
            max_attempts: 5,
            heartbeat_interval_ms: 1_000,
            heartbeat_timeout_ms: 500,
            outbound_capacity: 16,
        }
    }

    /// Reject timers and capacities the supervisor cannot run with.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        let zero = [
            ("heartbeat_interval_ms", self.heartbeat_interval_ms == 0),
            ("heartbeat_timeout_ms", self.heartbeat_timeout_ms == 0),
            ("outbound_capacity", self.outbound_capacity == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((field, _)) => Err(ConnectionError::InvalidOptions(format!(
                "{field} must be non-zero"
            ))),
            None => Ok(()),
        }
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_jitter(&self) -> Duration {
        Duration::from_millis(self.backoff_jitter_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConnectionOptions::default();
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.backoff_cap(), Duration::from_secs(30));
        assert!(options.heartbeat_timeout() < options.heartbeat_interval());
    }

    #[test]
    fn test_testing_options() {
        let options = ConnectionOptions::for_testing();
        assert_eq!(options.backoff_jitter(), Duration::ZERO);
        assert_eq!(options.validate(), Ok(()));
    }

    #[test]
    fn test_zero_timers_rejected() {
        let options = ConnectionOptions {
            heartbeat_interval_ms: 0,
            ..ConnectionOptions::for_testing()
        };
        assert!(matches!(
            options.validate(),
            Err(ConnectionError::InvalidOptions(reason)) if reason.contains("heartbeat_interval_ms")
        ));

        let options = ConnectionOptions {
            heartbeat_timeout_ms: 0,
            ..ConnectionOptions::for_testing()
        };
        assert!(options.validate().is_err());
    }
}
