//! # Client Container
//!
//! Builds every component with its platform dependencies and hands the
//! assembled parts to `SyncClient`. Anything not supplied falls back to the
//! headless defaults: WebSocket transport, tracing alert sink, system clock,
//! no device capabilities and a push prompt that is always declined.

pub mod config;

use std::sync::Arc;

use rt_01_connection::{ConnectionControl, ConnectionManager, Transport, WebSocketTransport};
use rt_04_state_reconciler::StateReconciler;
use rt_05_notifications::{
    AlertSink, Clock, NotificationDispatcher, PermissionRequester, PermissionState,
    PlatformCapabilities, StaticPermissions, SystemClock, TracingAlertSink,
};
use rt_06_expiration::ExpirationSweeper;
use shared_bus::InMemoryEventBus;
use tokio::sync::{mpsc, watch};

pub use config::{ConfigError, SyncConfig};

use crate::adapters::ConnectionSink;
use crate::client::SyncClient;
use crate::handlers::SyncPipeline;
use crate::wiring::EventLoop;

pub struct SyncClientBuilder {
    config: SyncConfig,
    transport: Option<Arc<dyn Transport>>,
    alert_sink: Option<Arc<dyn AlertSink>>,
    permissions: Option<Arc<dyn PermissionRequester>>,
    clock: Option<Arc<dyn Clock>>,
    capabilities: PlatformCapabilities,
}

impl SyncClientBuilder {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            transport: None,
            alert_sink: None,
            permissions: None,
            clock: None,
            capabilities: PlatformCapabilities::none(),
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = Some(sink);
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionRequester>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn build(self) -> SyncClient {
        let config = self.config;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WebSocketTransport::new()));
        let alert_sink = self
            .alert_sink
            .unwrap_or_else(|| Arc::new(TracingAlertSink));
        let permissions = self.permissions.unwrap_or_else(|| {
            Arc::new(StaticPermissions::new(
                PermissionState::Prompt,
                PermissionState::Denied,
            ))
        });
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let (connection, events) = ConnectionManager::new(transport, config.event_capacity);
        let connection = Arc::new(connection);

        let dispatcher = Arc::new(NotificationDispatcher::new(
            config.dispatcher.clone(),
            alert_sink,
            permissions,
            Arc::clone(&clock),
            self.capabilities,
        ));
        let pipeline = Arc::new(SyncPipeline::new(
            Arc::new(StateReconciler::new()),
            dispatcher,
            ExpirationSweeper::new(config.sweeper.clone()),
            Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity)),
            clock,
        ));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let control: Arc<dyn ConnectionControl> = connection.clone();
        let event_loop = EventLoop::new(
            config.router.clone(),
            config.subscriptions.clone(),
            ConnectionSink::new(control),
            Arc::clone(&pipeline),
            events,
            command_rx,
            shutdown_rx,
        );

        SyncClient::assemble(config, connection, pipeline, event_loop, command_tx, shutdown_tx)
    }
}
