//! # Connection State
//!
//! The single connection's observable state, shared between the connection
//! manager, the runtime, and connectivity indicators.
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!      ^              |             |
//!      |              v             v
//!      +-------- Reconnecting <-----+
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    /// Whether a transition from `self` to `next` is legal.
    #[must_use]
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connecting, Disconnected)
                | (Connected, Reconnecting)
                | (Connected, Disconnected)
                | (Reconnecting, Connecting)
                | (Reconnecting, Disconnected)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    /// Reconnect attempts since the last successful connect.
    pub attempt: u32,
    /// Last time any inbound traffic proved the peer alive.
    pub last_heartbeat_at: Option<Timestamp>,
    /// Set when reconnecting was abandoned; cleared by an explicit retry.
    pub gave_up: bool,
}

impl ConnectionSnapshot {
    /// Offline and waiting for a user-triggered retry.
    #[must_use]
    pub fn is_offline_terminal(&self) -> bool {
        self.state == ConnectionState::Disconnected && self.gave_up
    }
}

/// A transition of the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub attempt: u32,
    /// Terminal give-up after exhausting reconnect attempts.
    pub gave_up: bool,
    /// Human-readable cause (transport error text, "user disconnect", ...).
    pub reason: Option<String>,
    pub at: Timestamp,
}
