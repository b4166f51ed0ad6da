//! # Connection Diagnostics
//!
//! Lock-free counters for one connection manager instance.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the supervisor task.
#[derive(Debug, Default)]
pub struct ConnectionDiagnostics {
    pub connect_attempts: AtomicU64,
    pub connects_succeeded: AtomicU64,
    pub connect_failures: AtomicU64,
    pub reconnects_scheduled: AtomicU64,
    pub heartbeat_timeouts: AtomicU64,
    pub session_failures: AtomicU64,
    pub frames_received: AtomicU64,
    pub frames_sent: AtomicU64,
    pub sends_rejected: AtomicU64,
    pub gave_up: AtomicU64,
}

impl ConnectionDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current values.
    pub fn snapshot(&self) -> ConnectionDiagnosticsSnapshot {
        ConnectionDiagnosticsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connects_succeeded: self.connects_succeeded.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
            heartbeat_timeouts: self.heartbeat_timeouts.load(Ordering::Relaxed),
            session_failures: self.session_failures.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            sends_rejected: self.sends_rejected.load(Ordering::Relaxed),
            gave_up: self.gave_up.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of connection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConnectionDiagnosticsSnapshot {
    pub connect_attempts: u64,
    pub connects_succeeded: u64,
    pub connect_failures: u64,
    pub reconnects_scheduled: u64,
    pub heartbeat_timeouts: u64,
    pub session_failures: u64,
    pub frames_received: u64,
    pub frames_sent: u64,
    pub sends_rejected: u64,
    pub gave_up: u64,
}
