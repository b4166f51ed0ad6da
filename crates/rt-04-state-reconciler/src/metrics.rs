//! Reconciler diagnostic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct ReconcilerDiagnostics {
    pub inserted: AtomicU64,
    pub updated: AtomicU64,
    pub rejected_stale: AtomicU64,
    pub removed: AtomicU64,
    pub optimistic_applied: AtomicU64,
    pub rolled_back: AtomicU64,
    pub invalid_payloads: AtomicU64,
}

impl ReconcilerDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReconcilerDiagnosticsSnapshot {
        let inserted = self.inserted.load(Ordering::Relaxed);
        let updated = self.updated.load(Ordering::Relaxed);
        ReconcilerDiagnosticsSnapshot {
            applied: inserted + updated,
            inserted,
            updated,
            rejected_stale: self.rejected_stale.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            optimistic_applied: self.optimistic_applied.load(Ordering::Relaxed),
            rolled_back: self.rolled_back.load(Ordering::Relaxed),
            invalid_payloads: self.invalid_payloads.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilerDiagnosticsSnapshot {
    pub applied: u64,
    pub inserted: u64,
    pub updated: u64,
    pub rejected_stale: u64,
    pub removed: u64,
    pub optimistic_applied: u64,
    pub rolled_back: u64,
    pub invalid_payloads: u64,
}
