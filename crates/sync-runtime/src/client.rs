//! # Sync Client
//!
//! The consumer-facing facade. Constructed explicitly through
//! `SyncClientBuilder`; there is no global instance.
//!
//! ```rust,ignore
//! let client = SyncClient::builder(SyncConfig::from_env()?).build();
//! client.start()?;
//! let _repair = client.subscribe(Channel::repair(42)).await?;
//! let mut changes = client.on_entity_change(EntityKind::RepairProgress);
//! ```

use std::sync::Arc;

use chrono::Duration;
use parking_lot::Mutex;
use rt_01_connection::{ConnectionControl, ConnectionDiagnosticsSnapshot, ConnectionManager};
use rt_02_subscriptions::SubscriptionHandle;
use rt_04_state_reconciler::{AppliedResult, Reconcilable, ReconcilerDiagnosticsSnapshot};
use rt_05_notifications::{
    Alert, DispatcherDiagnosticsSnapshot, NotificationApi, NotificationPreferences,
    PermissionState,
};
use rt_06_expiration::{SweepReport, SweeperDiagnosticsSnapshot};
use serde::Serialize;
use shared_bus::{EventFilter, EventStream, EventTopic};
use shared_types::{
    Channel, ConnectionSnapshot, ConnectionState, EntityChange, EntityKind, NotificationDelta,
    NotificationItem, RepairPhoto, RepairProgress,
};
use sync_telemetry::log_event;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::container::{SyncClientBuilder, SyncConfig};
use crate::error::SyncError;
use crate::handlers::SyncPipeline;
use crate::wiring::{Command, EventLoop, LoopDiagnostics};
use crate::COMPONENT;

pub struct SyncClient {
    config: SyncConfig,
    connection: Arc<ConnectionManager>,
    pipeline: Arc<SyncPipeline>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: watch::Sender<bool>,
    /// Taken by `start()`.
    pending: Mutex<Option<EventLoop>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClient {
    pub fn builder(config: SyncConfig) -> SyncClientBuilder {
        SyncClientBuilder::new(config)
    }

    pub(crate) fn assemble(
        config: SyncConfig,
        connection: Arc<ConnectionManager>,
        pipeline: Arc<SyncPipeline>,
        event_loop: EventLoop,
        commands: mpsc::UnboundedSender<Command>,
        shutdown: watch::Sender<bool>,
    ) -> Self {
        Self {
            config,
            connection,
            pipeline,
            commands,
            shutdown,
            pending: Mutex::new(Some(event_loop)),
            task: Mutex::new(None),
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Spawn the event loop and open the connection. Must run inside a tokio
    /// runtime.
    pub fn start(&self) -> Result<(), SyncError> {
        self.config.validate()?;
        let event_loop = self.pending.lock().take().ok_or(SyncError::AlreadyStarted)?;
        *self.task.lock() = Some(tokio::spawn(event_loop.run()));

        log_event!(info, COMPONENT, "Sync client starting", url = %self.config.url);
        self.connection
            .connect(&self.config.url, self.config.connection.clone())?;
        Ok(())
    }

    /// Close the connection. Subscriptions and local state are kept, so
    /// `retry()` resumes where the client left off.
    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
    }

    /// Reconnect after giving up or after `disconnect()`.
    pub fn retry(&self) -> Result<(), SyncError> {
        self.connection.retry()?;
        Ok(())
    }

    /// Disconnect and stop the event loop.
    pub async fn shutdown(&self) {
        self.connection.disconnect().await;
        let _ = self.shutdown.send(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        log_event!(info, COMPONENT, "Sync client stopped");
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscribe to a channel. The subscription lasts until the guard is
    /// dropped or explicitly unsubscribed.
    pub async fn subscribe(
        &self,
        channel: impl Into<Channel>,
    ) -> Result<SubscriptionGuard, SyncError> {
        let (reply, response) = oneshot::channel();
        let handle = self
            .request(
                Command::Subscribe {
                    channel: channel.into(),
                    reply,
                },
                response,
            )
            .await??;
        Ok(SubscriptionGuard {
            handle: Some(handle),
            commands: self.commands.clone(),
        })
    }

    pub async fn active_channels(&self) -> Result<Vec<Channel>, SyncError> {
        let (reply, response) = oneshot::channel();
        self.request(Command::ActiveChannels { reply }, response).await
    }

    // =========================================================================
    // ENTITIES
    // =========================================================================

    pub fn get_entity<E: Reconcilable>(&self, id: &str) -> Option<E> {
        self.pipeline.reconciler().get::<E>(id)
    }

    /// Every stored entity of one family, ordered by id.
    pub fn entities<E: Reconcilable>(&self) -> Vec<E> {
        self.pipeline.reconciler().snapshot::<E>()
    }

    pub fn repair_progress(&self, id: &str) -> Option<RepairProgress> {
        self.get_entity(id)
    }

    pub fn notification(&self, id: &str) -> Option<NotificationItem> {
        self.get_entity(id)
    }

    pub fn photo(&self, id: &str) -> Option<RepairPhoto> {
        self.get_entity(id)
    }

    /// Changes to one entity family, including batch expirations.
    pub fn on_entity_change(&self, kind: EntityKind) -> EventStream {
        self.pipeline.bus().event_stream(EventFilter::kind(kind))
    }

    pub fn on_connection_change(&self) -> EventStream {
        self.pipeline
            .bus()
            .event_stream(EventFilter::topics(vec![EventTopic::Connection]))
    }

    pub fn on_alert(&self) -> EventStream {
        self.pipeline
            .bus()
            .event_stream(EventFilter::topics(vec![EventTopic::Alerts]))
    }

    pub fn events(&self, filter: EventFilter) -> EventStream {
        self.pipeline.bus().event_stream(filter)
    }

    /// Mark a notification read locally before the server confirms it. The
    /// next authoritative delta for the item replaces the local guess.
    pub fn mark_notification_read(&self, id: &str) -> Result<AppliedResult, SyncError> {
        let reconciler = self.pipeline.reconciler();
        let item = reconciler
            .get::<NotificationItem>(id)
            .ok_or_else(|| SyncError::UnknownEntity {
                kind: EntityKind::Notification,
                id: id.to_string(),
            })?;

        // Must be strictly newer than the stored item or the merge is stale.
        let at = self
            .pipeline
            .clock()
            .now()
            .max(item.updated_at + Duration::milliseconds(1));
        let mut delta = NotificationDelta::new(id, at);
        delta.read = Some(true);

        let result = reconciler.apply_optimistic::<NotificationItem>(delta);
        Ok(self.pipeline.publish_result(result))
    }

    /// Undo a pending optimistic update.
    pub fn rollback<E: Reconcilable>(&self, id: &str) -> Option<EntityChange> {
        let change = self.pipeline.reconciler().rollback::<E>(id)?;
        self.pipeline.publish_change(change.clone());
        Some(change)
    }

    /// Run an expiration sweep now.
    pub fn sweep_expired(&self) -> SweepReport {
        self.pipeline.sweep()
    }

    // =========================================================================
    // CONNECTION
    // =========================================================================

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connection_snapshot(&self) -> ConnectionSnapshot {
        self.connection.snapshot()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.connection.watch()
    }

    // =========================================================================
    // NOTIFICATIONS
    // =========================================================================

    pub async fn request_notification_permission(&self) -> PermissionState {
        self.pipeline.dispatcher().request_permission().await
    }

    pub fn set_preferences(&self, preferences: NotificationPreferences) {
        self.pipeline.dispatcher().set_preferences(preferences);
    }

    pub fn preferences(&self) -> NotificationPreferences {
        self.pipeline.dispatcher().preferences()
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.pipeline.dispatcher().active_alerts()
    }

    // =========================================================================
    // DIAGNOSTICS
    // =========================================================================

    pub async fn diagnostics(&self) -> Result<ClientDiagnostics, SyncError> {
        let (reply, response) = oneshot::channel();
        let LoopDiagnostics {
            router,
            subscriptions,
        } = self.request(Command::Diagnostics { reply }, response).await?;

        Ok(ClientDiagnostics {
            connection: self.connection.diagnostics(),
            router,
            subscriptions,
            reconciler: self.pipeline.reconciler().diagnostics(),
            notifications: self.pipeline.dispatcher().diagnostics(),
            expiration: self.pipeline.sweeper().diagnostics(),
        })
    }

    async fn request<T>(
        &self,
        command: Command,
        response: oneshot::Receiver<T>,
    ) -> Result<T, SyncError> {
        if self.task.lock().is_none() {
            return Err(SyncError::NotStarted);
        }
        self.commands.send(command).map_err(|_| SyncError::Stopped)?;
        response.await.map_err(|_| SyncError::Stopped)
    }
}

/// Counters from every component.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClientDiagnostics {
    pub connection: ConnectionDiagnosticsSnapshot,
    pub router: rt_03_message_router::RouterDiagnosticsSnapshot,
    pub subscriptions: rt_02_subscriptions::SubscriptionDiagnosticsSnapshot,
    pub reconciler: ReconcilerDiagnosticsSnapshot,
    pub notifications: DispatcherDiagnosticsSnapshot,
    pub expiration: SweeperDiagnosticsSnapshot,
}

/// Keeps a channel subscribed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SubscriptionGuard {
    handle: Option<SubscriptionHandle>,
    commands: mpsc::UnboundedSender<Command>,
}

impl SubscriptionGuard {
    pub fn channel(&self) -> Option<&Channel> {
        self.handle.as_ref().map(SubscriptionHandle::channel)
    }

    /// Unsubscribe and wait for the registry to confirm.
    pub async fn unsubscribe(mut self) -> Result<(), SyncError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Unsubscribe {
                handle,
                reply: Some(reply),
            })
            .map_err(|_| SyncError::Stopped)?;
        response.await.map_err(|_| SyncError::Stopped)??;
        Ok(())
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::Unsubscribe {
                handle,
                reply: None,
            });
        }
    }
}
