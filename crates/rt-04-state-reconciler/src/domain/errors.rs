//! Reconciler error types.
//!
//! A stale delta is not an error; see `RejectReason`.

use shared_types::{MessageType, ProtocolError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The payload does not decode as the entity's delta.
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] ProtocolError),

    /// The message type carries no entity.
    #[error("Message type {0} does not carry an entity")]
    NotAnEntityMessage(MessageType),
}
