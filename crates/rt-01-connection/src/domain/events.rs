//! Events the supervisor pushes into the single inbound queue.

use shared_types::StateChange;

/// One item of the serial event queue consumed by the sync loop.
///
/// Frames and state changes share the queue so a consumer always sees a
/// `Connected` transition before the first frame of that session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A text frame from the server.
    Frame(String),
    /// The connection changed state.
    StateChanged(StateChange),
}
