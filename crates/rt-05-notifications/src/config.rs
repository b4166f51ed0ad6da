//! Dispatcher configuration.

use serde::{Deserialize, Serialize};

/// Limits on intrusive delivery (sound, haptic, push).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Burst of intrusive alerts allowed at once.
    pub intrusive_burst: u32,
    /// Intrusive alerts regained per minute.
    pub intrusive_per_minute: u32,
    /// Upper bound on simultaneously shown in-app alerts; oldest are dropped.
    pub max_active_alerts: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            intrusive_burst: 5,
            intrusive_per_minute: 10,
            max_active_alerts: 100,
        }
    }
}

impl DispatcherConfig {
    pub fn for_testing() -> Self {
        Self {
            intrusive_burst: 3,
            intrusive_per_minute: 60,
            max_active_alerts: 10,
        }
    }
}
