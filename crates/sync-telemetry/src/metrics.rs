//! Prometheus metrics for the sync client.
//!
//! All metrics follow the naming convention: `rs_<component>_<metric>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g. `rs_router_messages_total`)
//! - **Gauge**: Value that can go up or down (e.g. `rs_subscriptions_active_channels`)
//! - **Histogram**: Distribution of values (e.g. `rs_connection_reconnect_delay_seconds`)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CONNECTION METRICS
    // =========================================================================

    /// State transitions by target state
    pub static ref CONNECTION_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("rs_connection_transitions_total", "Connection state transitions"),
        &["to"]  // to: disconnected/connecting/connected/reconnecting
    ).expect("metric creation failed");

    /// Current state (0 disconnected, 1 connecting, 2 connected, 3 reconnecting)
    pub static ref CONNECTION_STATE: Gauge = Gauge::new(
        "rs_connection_state",
        "Current connection state as an ordinal"
    ).expect("metric creation failed");

    /// Reconnect attempts
    pub static ref RECONNECT_ATTEMPTS: Counter = Counter::new(
        "rs_connection_reconnect_attempts_total",
        "Total reconnect attempts scheduled"
    ).expect("metric creation failed");

    /// Backoff delays chosen before reconnecting
    pub static ref RECONNECT_DELAY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "rs_connection_reconnect_delay_seconds",
            "Backoff delay before each reconnect attempt"
        ).buckets(exponential_buckets(0.5, 2.0, 8).unwrap_or_default())
    ).expect("metric creation failed");

    // =========================================================================
    // SUBSCRIPTION METRICS
    // =========================================================================

    /// Channels with at least one subscriber
    pub static ref ACTIVE_CHANNELS: Gauge = Gauge::new(
        "rs_subscriptions_active_channels",
        "Number of channels with a non-zero reference count"
    ).expect("metric creation failed");

    // =========================================================================
    // ROUTER METRICS
    // =========================================================================

    /// Inbound messages by type and outcome
    pub static ref ROUTER_MESSAGES: CounterVec = CounterVec::new(
        Opts::new("rs_router_messages_total", "Inbound messages by type and outcome"),
        &["message_type", "outcome"]  // outcome: accepted/malformed/unknown_type/unsubscribed/handler_error
    ).expect("metric creation failed");

    // =========================================================================
    // RECONCILER METRICS
    // =========================================================================

    /// Merge outcomes by entity kind
    pub static ref RECONCILER_MERGES: CounterVec = CounterVec::new(
        Opts::new("rs_reconciler_merges_total", "Merge outcomes by entity kind"),
        &["kind", "outcome"]  // outcome: inserted/applied/rejected/removed/rolled_back
    ).expect("metric creation failed");

    /// Entities currently held per store
    pub static ref ENTITIES_STORED: GaugeVec = GaugeVec::new(
        Opts::new("rs_reconciler_entities", "Entities currently held per store"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // NOTIFICATION METRICS
    // =========================================================================

    /// Notification pipeline outcomes
    pub static ref NOTIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("rs_notifications_total", "Notification pipeline outcomes"),
        &["outcome"]  // outcome: delivered/quiet/deduplicated/suppressed/degraded
    ).expect("metric creation failed");

    // =========================================================================
    // SWEEPER METRICS
    // =========================================================================

    /// Sweeps executed
    pub static ref SWEEP_RUNS: Counter = Counter::new(
        "rs_sweeper_runs_total",
        "Total expiration sweeps"
    ).expect("metric creation failed");

    /// Entities removed by sweeps
    pub static ref SWEEP_REMOVED: Counter = Counter::new(
        "rs_sweeper_removed_total",
        "Total entities removed by expiration"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Errors by component and type
    pub static ref SYNC_ERRORS: CounterVec = CounterVec::new(
        Opts::new("rs_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Keeps the registry alive for exporters.
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Idempotent: metrics already registered by an earlier call are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Connection
        Box::new(CONNECTION_TRANSITIONS.clone()),
        Box::new(CONNECTION_STATE.clone()),
        Box::new(RECONNECT_ATTEMPTS.clone()),
        Box::new(RECONNECT_DELAY.clone()),
        // Subscriptions
        Box::new(ACTIVE_CHANNELS.clone()),
        // Router
        Box::new(ROUTER_MESSAGES.clone()),
        // Reconciler
        Box::new(RECONCILER_MERGES.clone()),
        Box::new(ENTITIES_STORED.clone()),
        // Notifications
        Box::new(NOTIFICATIONS.clone()),
        // Sweeper
        Box::new(SWEEP_RUNS.clone()),
        Box::new(SWEEP_REMOVED.clone()),
        // Errors
        Box::new(SYNC_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Ordinal used for the `rs_connection_state` gauge.
pub fn connection_state_ordinal(state: &str) -> f64 {
    match state {
        "connecting" => 1.0,
        "connected" => 2.0,
        "reconnecting" => 3.0,
        _ => 0.0,
    }
}
