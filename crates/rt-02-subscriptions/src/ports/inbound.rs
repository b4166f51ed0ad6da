//! Inbound port: what consumers call.

use shared_types::Channel;

use crate::domain::{SubscriptionError, SubscriptionHandle};

/// Subscription API - inbound port.
pub trait SubscriptionApi {
    /// Register interest in a channel. Every call returns a distinct handle.
    fn subscribe(&mut self, channel: Channel) -> Result<SubscriptionHandle, SubscriptionError>;

    /// Release a handle.
    fn unsubscribe(&mut self, handle: &SubscriptionHandle) -> Result<(), SubscriptionError>;

    /// Whether inbound messages for `channel` should be acted on.
    fn is_active(&self, channel: &Channel) -> bool;

    fn active_channels(&self) -> Vec<Channel>;
}
