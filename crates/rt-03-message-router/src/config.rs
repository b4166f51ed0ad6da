//! Router configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Frames larger than this are rejected as malformed before parsing.
    pub max_frame_bytes: usize,
    /// Track per-channel sequence numbers and count gaps.
    pub track_sequences: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 1024 * 1024,
            track_sequences: true,
        }
    }
}

impl RouterConfig {
    pub fn for_testing() -> Self {
        Self {
            max_frame_bytes: 64 * 1024,
            track_sequences: true,
        }
    }
}
