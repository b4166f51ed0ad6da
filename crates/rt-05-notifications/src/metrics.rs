//! Dispatcher diagnostic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct DispatcherDiagnostics {
    pub shown: AtomicU64,
    pub updated: AtomicU64,
    pub dismissed: AtomicU64,
    pub suppressed: AtomicU64,
    pub quiet_hours: AtomicU64,
    pub rate_limited: AtomicU64,
    pub sounds: AtomicU64,
    pub haptics: AtomicU64,
    pub pushes: AtomicU64,
    pub degraded: AtomicU64,
}

impl DispatcherDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatcherDiagnosticsSnapshot {
        DispatcherDiagnosticsSnapshot {
            shown: self.shown.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            dismissed: self.dismissed.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            quiet_hours: self.quiet_hours.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            sounds: self.sounds.load(Ordering::Relaxed),
            haptics: self.haptics.load(Ordering::Relaxed),
            pushes: self.pushes.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherDiagnosticsSnapshot {
    pub shown: u64,
    pub updated: u64,
    pub dismissed: u64,
    pub suppressed: u64,
    pub quiet_hours: u64,
    pub rate_limited: u64,
    pub sounds: u64,
    pub haptics: u64,
    pub pushes: u64,
    pub degraded: u64,
}
