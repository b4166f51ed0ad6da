//! Requests from the facade to the event loop.

use rt_02_subscriptions::{SubscriptionDiagnosticsSnapshot, SubscriptionError, SubscriptionHandle};
use rt_03_message_router::RouterDiagnosticsSnapshot;
use serde::Serialize;
use shared_types::Channel;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum Command {
    Subscribe {
        channel: Channel,
        reply: oneshot::Sender<Result<SubscriptionHandle, SubscriptionError>>,
    },
    /// `reply` is absent when a guard is dropped.
    Unsubscribe {
        handle: SubscriptionHandle,
        reply: Option<oneshot::Sender<Result<(), SubscriptionError>>>,
    },
    ActiveChannels {
        reply: oneshot::Sender<Vec<Channel>>,
    },
    Diagnostics {
        reply: oneshot::Sender<LoopDiagnostics>,
    },
}

/// Counters of the loop-owned components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopDiagnostics {
    pub router: RouterDiagnosticsSnapshot,
    pub subscriptions: SubscriptionDiagnosticsSnapshot,
}
