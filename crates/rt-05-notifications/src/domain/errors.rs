//! Delivery errors reported by platform adapters.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The user has not granted permission for this channel.
    #[error("Permission denied")]
    PermissionDenied,

    /// The platform has no such capability.
    #[error("Channel unsupported: {0}")]
    Unsupported(&'static str),

    #[error("Platform error: {0}")]
    Platform(String),
}
