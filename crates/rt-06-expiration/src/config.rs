//! Sweeper configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Time between periodic sweeps.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

impl SweeperConfig {
    pub fn for_testing() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}
