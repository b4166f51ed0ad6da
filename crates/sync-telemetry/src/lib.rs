//! # Sync Telemetry
//!
//! Observability for the sync client.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events through a `tracing-subscriber` registry with
//!   an `EnvFilter` and a pretty or JSON formatter
//! - **Metrics**: process-wide Prometheus counters and gauges named
//!   `rs_<component>_<metric>`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sync_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SYNC_SERVICE_NAME` | `repair-sync` | Service name attached to logs |
//! | `SYNC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SYNC_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |
//! | `SYNC_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ACTIVE_CHANNELS, CONNECTION_STATE,
    CONNECTION_TRANSITIONS, ENTITIES_STORED, NOTIFICATIONS, RECONCILER_MERGES, RECONNECT_ATTEMPTS,
    ROUTER_MESSAGES, SWEEP_REMOVED, SWEEP_RUNS, SYNC_ERRORS,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for creating a span with component context.
///
/// ```rust,ignore
/// let _span = component_span!("apply_delta", component = "reconciler", entity_id = %id).entered();
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "repair-sync");
    }

    #[test]
    fn test_metric_inc_macro() {
        let before = ROUTER_MESSAGES
            .with_label_values(&["notification", "accepted"])
            .get();
        metric_inc!(ROUTER_MESSAGES, &["notification", "accepted"]);
        let after = ROUTER_MESSAGES
            .with_label_values(&["notification", "accepted"])
            .get();
        assert!(after >= before + 1.0);
    }
}
