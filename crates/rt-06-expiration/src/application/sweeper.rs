//! # Expiration Sweeper Service

use std::sync::atomic::Ordering;

use shared_types::Timestamp;
use sync_telemetry::{log_event, SWEEP_REMOVED, SWEEP_RUNS};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::config::SweeperConfig;
use crate::domain::SweepReport;
use crate::metrics::{SweeperDiagnostics, SweeperDiagnosticsSnapshot};
use crate::ports::ExpiringStore;
use crate::COMPONENT;

#[derive(Debug, Default)]
pub struct ExpirationSweeper {
    config: SweeperConfig,
    diagnostics: SweeperDiagnostics,
}

impl ExpirationSweeper {
    pub fn new(config: SweeperConfig) -> Self {
        Self {
            config,
            diagnostics: SweeperDiagnostics::new(),
        }
    }

    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Remove everything in `store` that has expired as of `now`.
    pub fn sweep(&self, store: &dyn ExpiringStore, now: Timestamp) -> SweepReport {
        let removed = store.remove_expired(now);

        SweeperDiagnostics::add(&self.diagnostics.runs, 1);
        SWEEP_RUNS.inc();
        if removed.is_empty() {
            SweeperDiagnostics::add(&self.diagnostics.empty_runs, 1);
        } else {
            SweeperDiagnostics::add(&self.diagnostics.removed, removed.len() as u64);
            SWEEP_REMOVED.inc_by(removed.len() as f64);
            log_event!(
                debug,
                COMPONENT,
                "Expired entities removed",
                removed = removed.len(),
                total_runs = self.diagnostics.runs.load(Ordering::Relaxed)
            );
        }

        SweepReport::new(now, removed)
    }

    /// Periodic tick source. The first tick fires one interval from now, and
    /// a stalled loop does not cause a burst of catch-up sweeps.
    pub fn ticker(&self) -> Interval {
        let period = self.config.interval.max(std::time::Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    pub fn diagnostics(&self) -> SweeperDiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}
