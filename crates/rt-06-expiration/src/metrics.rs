//! Sweeper diagnostic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct SweeperDiagnostics {
    pub runs: AtomicU64,
    pub removed: AtomicU64,
    /// Runs that removed nothing.
    pub empty_runs: AtomicU64,
}

impl SweeperDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SweeperDiagnosticsSnapshot {
        SweeperDiagnosticsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            empty_runs: self.empty_runs.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweeperDiagnosticsSnapshot {
    pub runs: u64,
    pub removed: u64,
    pub empty_runs: u64,
}
