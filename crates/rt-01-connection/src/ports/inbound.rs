//! # Inbound Ports
//!
//! The API the sync runtime uses to drive the connection.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{ClientMessage, ConnectionError, ConnectionSnapshot, StateChange};
use tokio::sync::watch;

use crate::config::ConnectionOptions;
use crate::metrics::ConnectionDiagnosticsSnapshot;

/// Callback invoked on every state transition.
pub type StateCallback = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Connection lifecycle API - inbound port.
#[async_trait]
pub trait ConnectionControl: Send + Sync {
    /// Start driving a connection to `url`. Returns immediately; progress is
    /// reported through state changes.
    fn connect(&self, url: &str, options: ConnectionOptions) -> Result<(), ConnectionError>;

    /// Stop the connection and cancel pending reconnect timers. Resolves once
    /// the connection is `Disconnected`.
    async fn disconnect(&self);

    /// Restart after the manager gave up, with a fresh attempt counter.
    fn retry(&self) -> Result<(), ConnectionError>;

    /// Queue a message for the server. Fails fast unless connected.
    fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError>;

    /// Register a state-change callback. Callbacks run on the supervisor task
    /// and must not block.
    fn on_state_change(&self, callback: StateCallback);

    /// Current state.
    fn snapshot(&self) -> ConnectionSnapshot;

    /// Receiver that observes every state change.
    fn watch(&self) -> watch::Receiver<ConnectionSnapshot>;

    /// Counter snapshot.
    fn diagnostics(&self) -> ConnectionDiagnosticsSnapshot;
}
