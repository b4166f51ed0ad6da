//! # Outbound Ports
//!
//! The transport the connection manager drives. Production uses a WebSocket;
//! tests use the in-memory mock.

use async_trait::async_trait;
use shared_types::TransportError;

/// A transport-level frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// JSON text.
    Text(String),
    /// Transport ping; answered with a pong carrying the same payload.
    Ping(Vec<u8>),
    /// Transport pong.
    Pong(Vec<u8>),
    /// Peer requested close.
    Close,
}

/// Writing half of an open connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one frame.
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Close the connection gracefully.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Reading half of an open connection.
///
/// `next_frame` must be cancel safe: it is polled inside `select!`.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the stream has ended.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
}

/// The two halves returned by a successful open.
pub type TransportPair = (Box<dyn FrameSink>, Box<dyn FrameSource>);

/// Connection factory - outbound port.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new connection to `url`.
    async fn open(&self, url: &str) -> Result<TransportPair, TransportError>;

    /// Transport name (for logging/debugging).
    fn name(&self) -> &str;
}
