//! # Entity Pipeline
//!
//! ```text
//! InboundMessage ──► StateReconciler ──► EntityChange ──► event bus
//!                                            │
//!                                 (notifications only)
//!                                            ▼
//!                              NotificationDispatcher ──► AlertEvent
//!                                            │
//!                                            ▼
//!                                 ExpirationSweeper (on demand)
//! ```
//!
//! Every stage is internally synchronized, so the pipeline is shared between
//! the event loop and the `SyncClient` facade.

use std::sync::Arc;

use rt_03_message_router::RouteError;
use rt_04_state_reconciler::{AppliedResult, ReconcilerApi, StateReconciler};
use rt_05_notifications::{Clock, NotificationApi, NotificationDispatcher, NotifyOutcome};
use rt_06_expiration::{ExpirationSweeper, SweepReport};
use shared_bus::{AlertEvent, InMemoryEventBus, SyncEvent};
use shared_types::{EntityChange, EntityKind, InboundMessage, NotificationItem};

use crate::COMPONENT;

pub struct SyncPipeline {
    reconciler: Arc<StateReconciler>,
    dispatcher: Arc<NotificationDispatcher>,
    sweeper: ExpirationSweeper,
    bus: Arc<InMemoryEventBus>,
    clock: Arc<dyn Clock>,
}

impl SyncPipeline {
    pub fn new(
        reconciler: Arc<StateReconciler>,
        dispatcher: Arc<NotificationDispatcher>,
        sweeper: ExpirationSweeper,
        bus: Arc<InMemoryEventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reconciler,
            dispatcher,
            sweeper,
            bus,
            clock,
        }
    }

    /// Router handler body for entity and delete messages.
    pub fn handle_message(&self, message: &InboundMessage) -> Result<(), RouteError> {
        let result = self
            .reconciler
            .apply_message(message)
            .map_err(|e| RouteError::Handler(e.to_string()))?;
        self.publish_result(result);
        Ok(())
    }

    /// Publish the change carried by a merge result, if any.
    pub fn publish_result(&self, result: AppliedResult) -> AppliedResult {
        if let Some(change) = &result.change {
            self.publish_change(change.clone());
        }
        result
    }

    /// Announce a change and drive alerts for notification changes.
    pub fn publish_change(&self, change: EntityChange) {
        let kind = change.kind;
        let id = change.id.clone();
        let removed = change.is_removal();
        self.bus.publish_now(SyncEvent::EntityChanged(change));

        if kind != EntityKind::Notification {
            return;
        }
        if removed {
            if self.dispatcher.dismiss(&id) {
                self.publish_alert(AlertEvent::Dismissed {
                    notification_id: id,
                });
            }
            return;
        }
        if let Some(item) = self.reconciler.get::<NotificationItem>(&id) {
            self.notify(&item);
            self.sweep();
        }
    }

    /// Remove expired entities now and dismiss their alerts.
    pub fn sweep(&self) -> SweepReport {
        let report = self.sweeper.sweep(self.reconciler.as_ref(), self.clock.now());
        if report.is_empty() {
            return report;
        }

        let ids = report.ids(EntityKind::Notification);
        for id in &ids {
            if self.dispatcher.dismiss(id) {
                self.publish_alert(AlertEvent::Dismissed {
                    notification_id: id.clone(),
                });
            }
        }
        self.bus.publish_now(SyncEvent::EntitiesExpired {
            kind: EntityKind::Notification,
            ids,
        });
        report
    }

    pub fn reconciler(&self) -> &Arc<StateReconciler> {
        &self.reconciler
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    pub fn sweeper(&self) -> &ExpirationSweeper {
        &self.sweeper
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn notify(&self, item: &NotificationItem) {
        let notification_id = item.id.clone();
        let event = match self.dispatcher.notify(item) {
            NotifyOutcome::Shown(channels) => AlertEvent::Shown {
                notification_id,
                intrusive: channels.is_intrusive(),
            },
            NotifyOutcome::Updated => AlertEvent::Updated { notification_id },
            NotifyOutcome::Dismissed => AlertEvent::Dismissed { notification_id },
            NotifyOutcome::Suppressed(reason) => {
                tracing::debug!(
                    component = COMPONENT,
                    notification_id = %item.id,
                    reason = ?reason,
                    "No alert raised"
                );
                AlertEvent::Suppressed { notification_id }
            }
        };
        self.publish_alert(event);
    }

    fn publish_alert(&self, event: AlertEvent) {
        self.bus.publish_now(SyncEvent::Alert(event));
    }
}
