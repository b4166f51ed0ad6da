//! In-memory transport for tests.
//!
//! `MockTransport` scripts the outcome of each `open()`; accepted connections
//! are handed to the paired `MockServer`, which can push frames to the client
//! and read what the client sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ClientMessage, TransportError};
use tokio::sync::mpsc;

use crate::ports::{Frame, FrameSink, FrameSource, Transport, TransportPair};

/// Result of one scripted `open()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Accept,
    Fail(String),
}

struct MockState {
    script: VecDeque<MockOutcome>,
    fallback: MockOutcome,
}

/// Scripted transport.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    opens: Arc<AtomicU32>,
    accepted: mpsc::UnboundedSender<MockConnection>,
}

impl MockTransport {
    /// Transport that accepts every connection unless scripted otherwise.
    pub fn new() -> (Self, MockServer) {
        let (accepted, incoming) = mpsc::unbounded_channel();
        let transport = Self {
            state: Arc::new(Mutex::new(MockState {
                script: VecDeque::new(),
                fallback: MockOutcome::Accept,
            })),
            opens: Arc::new(AtomicU32::new(0)),
            accepted,
        };
        (transport, MockServer { incoming })
    }

    /// Queue the outcome of the next unscripted `open()`.
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.state.lock().script.push_back(outcome);
    }

    /// Outcome used once the script is exhausted.
    pub fn set_fallback(&self, outcome: MockOutcome) {
        self.state.lock().fallback = outcome;
    }

    /// Fail every connection attempt from now on.
    pub fn fail_all(&self) {
        let mut state = self.state.lock();
        state.script.clear();
        state.fallback = MockOutcome::Fail("connection refused".to_string());
    }

    /// Number of `open()` calls so far.
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, _url: &str) -> Result<TransportPair, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let outcome = {
            let mut state = self.state.lock();
            state
                .script
                .pop_front()
                .unwrap_or_else(|| state.fallback.clone())
        };

        match outcome {
            MockOutcome::Fail(reason) => Err(TransportError::ConnectFailed(reason)),
            MockOutcome::Accept => {
                let (to_client, from_server) = mpsc::unbounded_channel();
                let (to_server, from_client) = mpsc::unbounded_channel();
                let connection = MockConnection {
                    to_client,
                    from_client,
                };
                self.accepted
                    .send(connection)
                    .map_err(|_| TransportError::ConnectFailed("mock server dropped".into()))?;
                Ok((
                    Box::new(MockSink { to_server }),
                    Box::new(MockSource { from_server }),
                ))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Server side of a `MockTransport`.
pub struct MockServer {
    incoming: mpsc::UnboundedReceiver<MockConnection>,
}

impl MockServer {
    /// Wait for the client to open the next connection.
    pub async fn accept(&mut self) -> Option<MockConnection> {
        self.incoming.recv().await
    }
}

/// Server end of one accepted connection. Dropping it closes the connection.
pub struct MockConnection {
    to_client: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    from_client: mpsc::UnboundedReceiver<Frame>,
}

impl MockConnection {
    /// Push a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.send_frame(Frame::Text(text.into()))
    }

    pub fn send_frame(&self, frame: Frame) -> bool {
        self.to_client.send(Ok(frame)).is_ok()
    }

    /// Make the client's next read fail.
    pub fn fail(&self, error: TransportError) -> bool {
        self.to_client.send(Err(error)).is_ok()
    }

    /// Next frame the client wrote, `None` once the client side is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.from_client.recv().await
    }

    /// Next client message, skipping non-text frames.
    pub async fn recv_message(&mut self) -> Option<ClientMessage> {
        while let Some(frame) = self.recv().await {
            if let Frame::Text(text) = frame {
                if let Ok(message) = serde_json::from_str(&text) {
                    return Some(message);
                }
            }
        }
        None
    }

    /// Client messages already written, without waiting.
    pub fn drain_messages(&mut self) -> Vec<ClientMessage> {
        let mut messages = Vec::new();
        while let Ok(frame) = self.from_client.try_recv() {
            if let Frame::Text(text) = frame {
                if let Ok(message) = serde_json::from_str(&text) {
                    messages.push(message);
                }
            }
        }
        messages
    }
}

struct MockSink {
    to_server: mpsc::UnboundedSender<Frame>,
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.to_server
            .send(frame)
            .map_err(|_| TransportError::SendFailed("mock peer gone".into()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let _ = self.to_server.send(Frame::Close);
        Ok(())
    }
}

struct MockSource {
    from_server: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
}

#[async_trait]
impl FrameSource for MockSource {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        self.from_server.recv().await
    }
}
