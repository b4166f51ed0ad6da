//! # Subscription Service
//!
//! Connects the pure `ChannelRegistry` to a `SubscriptionSink` and records
//! diagnostics. Owned by the sync loop; every call runs on that single task.

use chrono::Utc;
use shared_types::{Channel, ClientMessage};
use sync_telemetry::{log_channel_event, ACTIVE_CHANNELS};

use crate::config::SubscriptionConfig;
use crate::domain::{ChannelRegistry, RegistryAction, SubscriptionError, SubscriptionHandle};
use crate::metrics::{SubscriptionDiagnostics, SubscriptionDiagnosticsSnapshot};
use crate::ports::{SubscriptionApi, SubscriptionSink};
use crate::COMPONENT;

pub struct SubscriptionService<S> {
    registry: ChannelRegistry,
    sink: S,
    diagnostics: SubscriptionDiagnostics,
}

impl<S: SubscriptionSink> SubscriptionService<S> {
    pub fn new(config: SubscriptionConfig, sink: S) -> Self {
        Self {
            registry: ChannelRegistry::new(config.max_channels),
            sink,
            diagnostics: SubscriptionDiagnostics::new(),
        }
    }

    /// Replay every active channel after (re)connecting. Returns how many
    /// subscribe messages were sent.
    pub fn on_connected(&mut self) -> usize {
        let actions = self.registry.on_connected();
        let mut sent = 0;
        for action in actions {
            SubscriptionDiagnostics::incr(&self.diagnostics.replays);
            if self.perform(action) {
                sent += 1;
            }
        }
        tracing::info!(component = COMPONENT, replayed = sent, "Subscriptions replayed");
        sent
    }

    pub fn on_disconnected(&mut self) {
        self.registry.on_disconnected();
    }

    pub fn ref_count(&self, channel: &Channel) -> usize {
        self.registry.ref_count(channel)
    }

    pub fn diagnostics(&self) -> SubscriptionDiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn perform(&mut self, action: RegistryAction) -> bool {
        let now = Utc::now();
        let (message, channel, is_subscribe) = match action {
            RegistryAction::SendSubscribe(channel) => {
                (ClientMessage::subscribe(channel.clone(), now), channel, true)
            }
            RegistryAction::SendUnsubscribe(channel) => {
                (ClientMessage::unsubscribe(channel.clone(), now), channel, false)
            }
        };

        match self.sink.send(&message) {
            Ok(()) => {
                let counter = if is_subscribe {
                    &self.diagnostics.transport_subscribes
                } else {
                    &self.diagnostics.transport_unsubscribes
                };
                SubscriptionDiagnostics::incr(counter);
                log_channel_event!(debug, COMPONENT, "Sent subscription message", channel, op = ?message.op);
                true
            }
            Err(error) => {
                SubscriptionDiagnostics::incr(&self.diagnostics.send_failures);
                if is_subscribe {
                    self.registry.mark_unannounced(&channel);
                }
                log_channel_event!(debug, COMPONENT, "Subscription message not sent", channel, error = %error);
                false
            }
        }
    }

    fn record_gauge(&self) {
        ACTIVE_CHANNELS.set(self.registry.len() as f64);
    }
}

impl<S: SubscriptionSink> SubscriptionApi for SubscriptionService<S> {
    fn subscribe(&mut self, channel: Channel) -> Result<SubscriptionHandle, SubscriptionError> {
        let (handle, action) = self.registry.subscribe(channel)?;
        SubscriptionDiagnostics::incr(&self.diagnostics.handles_issued);
        log_channel_event!(
            debug,
            COMPONENT,
            "Subscribed",
            handle.channel(),
            handle = handle.id(),
            ref_count = self.registry.ref_count(handle.channel())
        );
        if let Some(action) = action {
            self.perform(action);
        }
        self.record_gauge();
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: &SubscriptionHandle) -> Result<(), SubscriptionError> {
        let action = self.registry.unsubscribe(handle)?;
        SubscriptionDiagnostics::incr(&self.diagnostics.handles_released);
        log_channel_event!(
            debug,
            COMPONENT,
            "Unsubscribed",
            handle.channel(),
            handle = handle.id(),
            ref_count = self.registry.ref_count(handle.channel())
        );
        if let Some(action) = action {
            self.perform(action);
        }
        self.record_gauge();
        Ok(())
    }

    fn is_active(&self, channel: &Channel) -> bool {
        self.registry.is_active(channel)
    }

    fn active_channels(&self) -> Vec<Channel> {
        self.registry.active_channels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingSink;
    use shared_types::ClientOp;

    fn service() -> (SubscriptionService<RecordingSink>, RecordingSink) {
        let sink = RecordingSink::new();
        let service = SubscriptionService::new(SubscriptionConfig::for_testing(), sink.clone());
        (service, sink)
    }

    #[test]
    fn test_ref_counted_transport_messages() {
        let (mut service, sink) = service();
        service.on_connected();

        let channel = Channel::repair(42);
        let handles: Vec<_> = (0..4)
            .map(|_| service.subscribe(channel.clone()).unwrap())
            .collect();
        for handle in &handles {
            service.unsubscribe(handle).unwrap();
        }

        assert_eq!(sink.count(ClientOp::Subscribe), 1);
        assert_eq!(sink.count(ClientOp::Unsubscribe), 1);
        assert!(!service.is_active(&channel));
    }

    #[test]
    fn test_two_consumers_keep_channel_active() {
        let (mut service, sink) = service();
        service.on_connected();
        let channel = Channel::repair(42);

        let first = service.subscribe(channel.clone()).unwrap();
        let second = service.subscribe(channel.clone()).unwrap();

        service.unsubscribe(&first).unwrap();
        assert!(service.is_active(&channel));
        assert_eq!(sink.count(ClientOp::Unsubscribe), 0);

        service.unsubscribe(&second).unwrap();
        assert!(!service.is_active(&channel));
        assert_eq!(sink.count(ClientOp::Unsubscribe), 1);
    }

    #[test]
    fn test_failed_send_is_replayed_on_connect() {
        let (mut service, sink) = service();
        service.on_connected();
        sink.set_offline(true);

        let _handle = service.subscribe(Channel::photos(3)).unwrap();
        assert_eq!(service.diagnostics().send_failures, 1);

        sink.set_offline(false);
        service.on_disconnected();
        assert_eq!(service.on_connected(), 1);
        assert_eq!(sink.sent()[0].channel, Some(Channel::photos(3)));
    }

    #[test]
    fn test_offline_subscriptions_wait_for_connect() {
        let (mut service, sink) = service();
        let _a = service.subscribe(Channel::repair(1)).unwrap();
        let _b = service.subscribe(Channel::repair(1)).unwrap();
        assert!(sink.sent().is_empty());

        service.on_connected();
        assert_eq!(sink.count(ClientOp::Subscribe), 1);
        assert_eq!(service.diagnostics().replays, 1);
    }
}
