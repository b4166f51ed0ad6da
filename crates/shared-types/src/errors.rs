//! # Error Types
//!
//! Defines the error taxonomy shared across components.
//!
//! | Error | Recovery |
//! |-------|----------|
//! | `TransportError` | Automatic reconnect with backoff; surfaced only as a state change |
//! | `ProtocolError` | Frame dropped and counted; processing continues |
//! | `ConnectionError::NotConnected` | Returned to the caller of `send()`; no queuing |
//! | `ConnectionError::MaxRetriesExceeded` | Terminal; explicit retry required |

use std::time::Duration;

use thiserror::Error;

/// Failures of the underlying transport connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Opening the connection failed.
    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    /// The peer closed the connection.
    #[error("Connection closed by peer")]
    Closed,

    /// No inbound traffic within the heartbeat window.
    #[error("Heartbeat timed out after {0:?}")]
    HeartbeatTimeout(Duration),

    /// Writing a frame failed.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Reading from the connection failed.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Malformed or undecodable inbound data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame is not a valid message envelope.
    #[error("Malformed frame: {0}")]
    Malformed(String),

    /// The envelope parsed but the payload does not match its type.
    #[error("Invalid payload for {message_type}: {reason}")]
    InvalidPayload {
        message_type: String,
        reason: String,
    },

    /// Binary or otherwise unsupported frame.
    #[error("Unsupported frame")]
    UnsupportedFrame,
}

/// Errors returned by the connection manager's public API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// `send()` called while not connected. Callers decide whether to buffer.
    #[error("Not connected")]
    NotConnected,

    /// All reconnect attempts failed; the connection is offline until retried.
    #[error("Gave up after {attempts} reconnect attempts")]
    MaxRetriesExceeded { attempts: u32 },

    /// The per-session outbound queue is full.
    #[error("Outbound queue full")]
    OutboundFull,

    /// `connect()` called while a connection is already being driven.
    #[error("Connection already running")]
    AlreadyRunning,

    /// The target is not a `ws://` or `wss://` URL.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// Connection options that cannot drive a session.
    #[error("Invalid connection options: {0}")]
    InvalidOptions(String),

    /// `retry()` called without a previous `connect()`.
    #[error("No connection target configured")]
    NoTarget,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
