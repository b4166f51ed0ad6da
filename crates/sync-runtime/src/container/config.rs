//! # Sync Configuration
//!
//! Unified configuration for every component plus runtime parameters.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SYNC_URL` | `url` | `ws://localhost:8080/sync` |
//! | `SYNC_MAX_RETRIES` | `connection.max_attempts` | 5 |
//! | `SYNC_HEARTBEAT_INTERVAL_SECS` | `connection.heartbeat_interval_ms` | 25 |
//! | `SYNC_SWEEP_INTERVAL_SECS` | `sweeper.interval` | 60 |
//! | `SYNC_EVENT_CAPACITY` | `event_capacity` | 256 |
//! | `SYNC_BUS_CAPACITY` | `bus_capacity` | 1000 |

use std::str::FromStr;
use std::time::Duration;

use rt_01_connection::ConnectionOptions;
use rt_02_subscriptions::SubscriptionConfig;
use rt_03_message_router::RouterConfig;
use rt_05_notifications::DispatcherConfig;
use rt_06_expiration::SweeperConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Sync server endpoint (`ws://` or `wss://`).
    pub url: String,
    pub connection: ConnectionOptions,
    pub subscriptions: SubscriptionConfig,
    pub router: RouterConfig,
    pub dispatcher: DispatcherConfig,
    pub sweeper: SweeperConfig,
    /// Capacity of the transport-to-loop event queue.
    pub event_capacity: usize,
    /// Per-subscriber buffer of the entity change bus.
    pub bus_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/sync".to_string(),
            connection: ConnectionOptions::default(),
            subscriptions: SubscriptionConfig::default(),
            router: RouterConfig::default(),
            dispatcher: DispatcherConfig::default(),
            sweeper: SweeperConfig::default(),
            event_capacity: 256,
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Short timers for tests against a mock transport.
    pub fn for_testing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection: ConnectionOptions::for_testing(),
            subscriptions: SubscriptionConfig::for_testing(),
            router: RouterConfig::default(),
            dispatcher: DispatcherConfig::for_testing(),
            sweeper: SweeperConfig::for_testing(),
            event_capacity: 64,
            bus_capacity: 64,
        }
    }

    /// Load from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup on top of the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("SYNC_URL") {
            config.url = url;
        }
        if let Some(retries) = parse::<u32>(&lookup, "SYNC_MAX_RETRIES")? {
            config.connection.max_attempts = retries;
        }
        if let Some(secs) = parse::<u64>(&lookup, "SYNC_HEARTBEAT_INTERVAL_SECS")? {
            config.connection.heartbeat_interval_ms = secs.saturating_mul(1_000);
        }
        if let Some(secs) = parse::<u64>(&lookup, "SYNC_SWEEP_INTERVAL_SECS")? {
            config.sweeper.interval = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse::<usize>(&lookup, "SYNC_EVENT_CAPACITY")? {
            config.event_capacity = capacity;
        }
        if let Some(capacity) = parse::<usize>(&lookup, "SYNC_BUS_CAPACITY")? {
            config.bus_capacity = capacity;
        }

        Ok(config)
    }

    /// Reject configurations the runtime cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {e}", self.url)))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: scheme must be ws or wss",
                self.url
            )));
        }
        if self.connection.max_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                field: "connection.max_attempts",
                reason: "must be at least 1",
            });
        }
        if self.connection.heartbeat_interval_ms == 0 || self.connection.heartbeat_timeout_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "connection.heartbeat",
                reason: "interval and timeout must be non-zero",
            });
        }
        if self.sweeper.interval.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "sweeper.interval",
                reason: "must be non-zero",
            });
        }
        if self.event_capacity == 0 || self.bus_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "capacity",
                reason: "queues need room for at least one event",
            });
        }
        Ok(())
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid sync URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{field} {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}
