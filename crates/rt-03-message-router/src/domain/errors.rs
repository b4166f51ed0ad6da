//! Routing error types.

use shared_types::ProtocolError;
use thiserror::Error;

/// Failure reported by a handler. Logged and counted; dispatch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Handler failed: {0}")]
    Handler(String),
}
