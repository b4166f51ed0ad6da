//! # Event Loop
//!
//! ```text
//!  transport events ─┐
//!  client commands  ─┼──► select! ──► router / registry / pipeline
//!  sweep ticker     ─┘
//! ```
//!
//! Frames are dispatched strictly in arrival order. Connection transitions
//! drive the registry: `Connected` replays every active channel, anything
//! else marks the channels as unannounced.

use std::sync::Arc;

use rt_01_connection::TransportEvent;
use rt_02_subscriptions::{SubscriptionApi, SubscriptionConfig, SubscriptionService};
use rt_03_message_router::{MessageRouter, RouteError, RouterConfig};
use shared_bus::SyncEvent;
use shared_types::{Channel, ConnectionState, InboundMessage, MessageType, StateChange};
use sync_telemetry::log_event;
use tokio::sync::{mpsc, watch};

use crate::adapters::ConnectionSink;
use crate::handlers::SyncPipeline;
use crate::wiring::commands::{Command, LoopDiagnostics};
use crate::COMPONENT;

pub struct EventLoop {
    router: MessageRouter,
    subscriptions: SubscriptionService<ConnectionSink>,
    pipeline: Arc<SyncPipeline>,
    events: mpsc::Receiver<TransportEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    shutdown: watch::Receiver<bool>,
}

impl EventLoop {
    pub fn new(
        router_config: RouterConfig,
        subscription_config: SubscriptionConfig,
        sink: ConnectionSink,
        pipeline: Arc<SyncPipeline>,
        events: mpsc::Receiver<TransportEvent>,
        commands: mpsc::UnboundedReceiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let mut router = MessageRouter::new(router_config);
        for message_type in [
            MessageType::RepairProgress,
            MessageType::RepairPhoto,
            MessageType::Notification,
            MessageType::EntityDeleted,
        ] {
            let pipeline = Arc::clone(&pipeline);
            router.register(
                message_type,
                move |message: &InboundMessage| -> Result<(), RouteError> {
                    pipeline.handle_message(message)
                },
            );
        }

        Self {
            router,
            subscriptions: SubscriptionService::new(subscription_config, sink),
            pipeline,
            events,
            commands,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut sweep = self.pipeline.sweeper().ticker();
        log_event!(info, COMPONENT, "Event loop started");

        loop {
            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                Some(command) = self.commands.recv() => self.handle_command(command),
                event = self.events.recv() => match event {
                    Some(event) => self.handle_transport(event),
                    None => break,
                },
                _ = sweep.tick() => {
                    self.pipeline.sweep();
                }
            }
        }

        log_event!(info, COMPONENT, "Event loop stopped");
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Frame(frame) => {
                let subscriptions = &self.subscriptions;
                let gate = |channel: &Channel| subscriptions.is_active(channel);
                self.router.dispatch_frame(&frame, &gate);
            }
            TransportEvent::StateChanged(change) => self.handle_state_change(change),
        }
    }

    fn handle_state_change(&mut self, change: StateChange) {
        if change.to == ConnectionState::Connected {
            self.router.reset_sequences();
            self.subscriptions.on_connected();
        } else {
            self.subscriptions.on_disconnected();
        }
        self.pipeline
            .bus()
            .publish_now(SyncEvent::ConnectionStateChanged(change));
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Subscribe { channel, reply } => {
                let _ = reply.send(self.subscriptions.subscribe(channel));
            }
            Command::Unsubscribe { handle, reply } => {
                let result = self.subscriptions.unsubscribe(&handle);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(error) = result {
                            tracing::debug!(
                                component = COMPONENT,
                                handle = %handle,
                                error = %error,
                                "Dropped guard had no live subscription"
                            );
                        }
                    }
                }
            }
            Command::ActiveChannels { reply } => {
                let _ = reply.send(self.subscriptions.active_channels());
            }
            Command::Diagnostics { reply } => {
                let _ = reply.send(LoopDiagnostics {
                    router: self.router.diagnostics(),
                    subscriptions: self.subscriptions.diagnostics(),
                });
            }
        }
    }
}
