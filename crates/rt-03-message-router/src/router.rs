//! # Router
//!
//! Handler table plus the dispatch pipeline.

use std::collections::HashMap;

use shared_types::{Channel, InboundMessage, MessageType};
use sync_telemetry::{log_channel_event, ROUTER_MESSAGES, SYNC_ERRORS};

use crate::config::RouterConfig;
use crate::domain::{ChannelPattern, DispatchOutcome, HandlerId, RouteError};
use crate::metrics::{RouterDiagnostics, RouterDiagnosticsSnapshot};
use crate::ports::{ChannelGate, MessageHandler};
use crate::COMPONENT;

struct Route {
    id: HandlerId,
    message_type: MessageType,
    pattern: ChannelPattern,
    handler: Box<dyn MessageHandler>,
}

/// Message Router - one per connection, driven by the sync loop.
pub struct MessageRouter {
    config: RouterConfig,
    routes: Vec<Route>,
    next_id: u64,
    last_sequence: HashMap<Channel, u64>,
    diagnostics: RouterDiagnostics,
}

impl MessageRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            routes: Vec::new(),
            next_id: 1,
            last_sequence: HashMap::new(),
            diagnostics: RouterDiagnostics::new(),
        }
    }

    /// Register a handler for every channel of `message_type`.
    pub fn register<H>(&mut self, message_type: MessageType, handler: H) -> HandlerId
    where
        H: MessageHandler + 'static,
    {
        self.register_for_channel(message_type, ChannelPattern::Any, handler)
    }

    /// Register a handler for `message_type` on channels matching `pattern`.
    pub fn register_for_channel<H>(
        &mut self,
        message_type: MessageType,
        pattern: impl Into<ChannelPattern>,
        handler: H,
    ) -> HandlerId
    where
        H: MessageHandler + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        let pattern = pattern.into();
        tracing::debug!(
            component = COMPONENT,
            handler = id.0,
            message_type = %message_type,
            pattern = %pattern,
            "Handler registered"
        );
        self.routes.push(Route {
            id,
            message_type,
            pattern,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.routes.len();
        self.routes.retain(|route| route.id != id);
        self.routes.len() != before
    }

    pub fn handler_count(&self) -> usize {
        self.routes.len()
    }

    /// Parse a raw text frame and dispatch it.
    pub fn dispatch_frame(&mut self, frame: &str, gate: &dyn ChannelGate) -> DispatchOutcome {
        if frame.len() > self.config.max_frame_bytes {
            RouterDiagnostics::incr(&self.diagnostics.received);
            tracing::debug!(
                component = COMPONENT,
                bytes = frame.len(),
                "Dropping oversized frame"
            );
            return self.finish("oversized", DispatchOutcome::Malformed);
        }
        match InboundMessage::parse(frame) {
            Ok(message) => self.dispatch(&message, gate),
            Err(error) => {
                RouterDiagnostics::incr(&self.diagnostics.received);
                tracing::debug!(component = COMPONENT, error = %error, "Dropping malformed frame");
                self.finish("malformed", DispatchOutcome::Malformed)
            }
        }
    }

    /// Dispatch a parsed message.
    pub fn dispatch(
        &mut self,
        message: &InboundMessage,
        gate: &dyn ChannelGate,
    ) -> DispatchOutcome {
        RouterDiagnostics::incr(&self.diagnostics.received);
        let type_label = message.message_type.as_str().to_string();

        if let MessageType::Unknown(name) = &message.message_type {
            log_channel_event!(
                debug,
                COMPONENT,
                "Dropping unknown message type",
                message.channel,
                message_type = %name
            );
            return self.finish("unknown", DispatchOutcome::UnknownType);
        }

        let control = message.message_type == MessageType::HeartbeatAck;
        if control {
            RouterDiagnostics::incr(&self.diagnostics.control);
        } else if !gate.is_active(&message.channel) {
            log_channel_event!(
                debug,
                COMPONENT,
                "Dropping message for inactive channel",
                message.channel,
                message_type = %type_label
            );
            return self.finish(&type_label, DispatchOutcome::Unsubscribed);
        }

        if let Some(sequence) = message.sequence {
            self.track_sequence(&message.channel, sequence);
        }

        let mut handlers = 0;
        let mut failures = 0;
        for route in self.routes.iter_mut() {
            if route.message_type != message.message_type
                || !route.pattern.matches(&message.channel)
            {
                continue;
            }
            handlers += 1;
            if let Err(error) = route.handler.handle(message) {
                failures += 1;
                RouterDiagnostics::incr(&self.diagnostics.handler_errors);
                log_handler_error(route.id, message, &error);
            }
        }

        let outcome = if handlers == 0 {
            if control {
                // No one listens for acks; liveness was already recorded by
                // the connection.
                DispatchOutcome::Delivered {
                    handlers: 0,
                    failures: 0,
                }
            } else {
                DispatchOutcome::Unhandled
            }
        } else {
            DispatchOutcome::Delivered { handlers, failures }
        };
        self.finish(&type_label, outcome)
    }

    fn track_sequence(&mut self, channel: &Channel, sequence: u64) {
        if !self.config.track_sequences {
            return;
        }
        match self.last_sequence.get(channel).copied() {
            Some(last) if sequence <= last => {
                RouterDiagnostics::incr(&self.diagnostics.out_of_order);
                log_channel_event!(debug, COMPONENT, "Out-of-order sequence", channel, last, sequence);
                return;
            }
            Some(last) if sequence > last + 1 => {
                RouterDiagnostics::incr(&self.diagnostics.sequence_gaps);
                log_channel_event!(debug, COMPONENT, "Sequence gap", channel, last, sequence);
            }
            _ => {}
        }
        self.last_sequence.insert(channel.clone(), sequence);
    }

    /// Forget sequence state; a fresh connection restarts numbering.
    pub fn reset_sequences(&mut self) {
        self.last_sequence.clear();
    }

    fn finish(&self, type_label: &str, outcome: DispatchOutcome) -> DispatchOutcome {
        let counter = match outcome {
            DispatchOutcome::Delivered { .. } => &self.diagnostics.delivered,
            DispatchOutcome::Malformed => &self.diagnostics.malformed,
            DispatchOutcome::UnknownType => &self.diagnostics.unknown_type,
            DispatchOutcome::Unsubscribed => &self.diagnostics.unsubscribed,
            DispatchOutcome::Unhandled => &self.diagnostics.unhandled,
        };
        RouterDiagnostics::incr(counter);
        ROUTER_MESSAGES
            .with_label_values(&[type_label, outcome.as_str()])
            .inc();
        outcome
    }

    pub fn diagnostics(&self) -> RouterDiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

fn log_handler_error(id: HandlerId, message: &InboundMessage, error: &RouteError) {
    SYNC_ERRORS
        .with_label_values(&[COMPONENT, "handler"])
        .inc();
    log_channel_event!(
        error,
        COMPONENT,
        "Handler failed",
        message.channel,
        handler = id.0,
        message_type = %message.message_type,
        error = %error
    );
}
