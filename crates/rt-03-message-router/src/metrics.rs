//! Router diagnostic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct RouterDiagnostics {
    pub received: AtomicU64,
    pub delivered: AtomicU64,
    pub malformed: AtomicU64,
    pub unknown_type: AtomicU64,
    pub unsubscribed: AtomicU64,
    pub unhandled: AtomicU64,
    pub handler_errors: AtomicU64,
    pub control: AtomicU64,
    pub sequence_gaps: AtomicU64,
    pub out_of_order: AtomicU64,
}

impl RouterDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RouterDiagnosticsSnapshot {
        RouterDiagnosticsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown_type: self.unknown_type.load(Ordering::Relaxed),
            unsubscribed: self.unsubscribed.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            control: self.control.load(Ordering::Relaxed),
            sequence_gaps: self.sequence_gaps.load(Ordering::Relaxed),
            out_of_order: self.out_of_order.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouterDiagnosticsSnapshot {
    pub received: u64,
    pub delivered: u64,
    pub malformed: u64,
    pub unknown_type: u64,
    pub unsubscribed: u64,
    pub unhandled: u64,
    pub handler_errors: u64,
    pub control: u64,
    pub sequence_gaps: u64,
    pub out_of_order: u64,
}
