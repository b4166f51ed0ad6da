//! Traits implemented by the router's collaborators.
//!
//! Both have blanket impls for closures, so the runtime can register
//! `|msg| { ... }` directly.

use shared_types::{Channel, InboundMessage};

use crate::domain::RouteError;

/// Receives messages of the `(type, channel)` pairs it was registered for.
pub trait MessageHandler: Send {
    fn handle(&mut self, message: &InboundMessage) -> Result<(), RouteError>;
}

impl<F> MessageHandler for F
where
    F: FnMut(&InboundMessage) -> Result<(), RouteError> + Send,
{
    fn handle(&mut self, message: &InboundMessage) -> Result<(), RouteError> {
        self(message)
    }
}

/// Answers whether a channel currently has an active subscription.
pub trait ChannelGate {
    fn is_active(&self, channel: &Channel) -> bool;
}

impl<F> ChannelGate for F
where
    F: Fn(&Channel) -> bool,
{
    fn is_active(&self, channel: &Channel) -> bool {
        self(channel)
    }
}
