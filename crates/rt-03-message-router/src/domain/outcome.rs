//! What happened to one dispatched message.

/// Identifies a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

/// Result of dispatching one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to `handlers` handlers, `failures` of which returned an error.
    Delivered { handlers: usize, failures: usize },
    /// Not a valid message envelope.
    Malformed,
    /// A message type this client does not know.
    UnknownType,
    /// No active subscription for the channel.
    Unsubscribed,
    /// Known, subscribed, but nobody registered for it.
    Unhandled,
}

impl DispatchOutcome {
    /// Label used for the `outcome` metric dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered { failures: 0, .. } => "delivered",
            Self::Delivered { .. } => "handler_error",
            Self::Malformed => "malformed",
            Self::UnknownType => "unknown_type",
            Self::Unsubscribed => "unsubscribed",
            Self::Unhandled => "unhandled",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}
