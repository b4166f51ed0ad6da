//! Errors surfaced by the `SyncClient`.

use rt_02_subscriptions::SubscriptionError;
use shared_types::{ConnectionError, EntityId, EntityKind};
use thiserror::Error;

use crate::container::ConfigError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error("Sync client already started")]
    AlreadyStarted,

    #[error("Sync client not started")]
    NotStarted,

    #[error("Event loop stopped")]
    Stopped,

    #[error("Unknown {kind} entity {id}")]
    UnknownEntity { kind: EntityKind, id: EntityId },
}
