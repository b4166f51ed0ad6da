//! Subscription error types.

use shared_types::Channel;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// The handle was never issued or was already released.
    #[error("Unknown subscription handle {0}")]
    UnknownHandle(u64),

    /// Channel names are concrete; patterns belong to router registrations.
    #[error("Invalid channel name '{0}'")]
    InvalidChannel(Channel),

    /// Subscribing would exceed the configured channel bound.
    #[error("Too many active channels (limit {limit})")]
    TooManyChannels { limit: usize },
}
