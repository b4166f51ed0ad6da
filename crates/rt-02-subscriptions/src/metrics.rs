//! Diagnostic counters for the subscription registry.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct SubscriptionDiagnostics {
    pub handles_issued: AtomicU64,
    pub handles_released: AtomicU64,
    pub transport_subscribes: AtomicU64,
    pub transport_unsubscribes: AtomicU64,
    pub replays: AtomicU64,
    pub send_failures: AtomicU64,
}

impl SubscriptionDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SubscriptionDiagnosticsSnapshot {
        SubscriptionDiagnosticsSnapshot {
            handles_issued: self.handles_issued.load(Ordering::Relaxed),
            handles_released: self.handles_released.load(Ordering::Relaxed),
            transport_subscribes: self.transport_subscribes.load(Ordering::Relaxed),
            transport_unsubscribes: self.transport_unsubscribes.load(Ordering::Relaxed),
            replays: self.replays.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionDiagnosticsSnapshot {
    pub handles_issued: u64,
    pub handles_released: u64,
    pub transport_subscribes: u64,
    pub transport_unsubscribes: u64,
    pub replays: u64,
    pub send_failures: u64,
}
