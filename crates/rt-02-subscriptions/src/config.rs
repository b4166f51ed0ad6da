//! Subscription registry configuration.

use serde::{Deserialize, Serialize};

/// Bounds on the channel set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Maximum number of distinct active channels.
    pub max_channels: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self { max_channels: 256 }
    }
}

impl SubscriptionConfig {
    pub fn for_testing() -> Self {
        Self { max_channels: 8 }
    }
}
