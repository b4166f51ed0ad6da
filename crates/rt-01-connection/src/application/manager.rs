//! # Connection Manager
//!
//! Owns the one transport connection of a client session.
//!
//! `connect()` spawns a supervisor task that opens the transport, runs the
//! session (frames in, frames out, heartbeat), and on failure walks the
//! reconnect/backoff cycle until it either succeeds or gives up. All frames
//! and state changes are pushed, in order, into a single bounded queue that
//! the sync loop consumes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared_types::{
    ClientMessage, ConnectionError, ConnectionSnapshot, ConnectionState, StateChange,
    TransportError,
};
use sync_telemetry::log_event;
use sync_telemetry::metrics::{
    connection_state_ordinal, CONNECTION_STATE, CONNECTION_TRANSITIONS, RECONNECT_ATTEMPTS,
    RECONNECT_DELAY,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ConnectionOptions;
use crate::domain::{BackoffPolicy, RetryDecision, RetryTracker, TransportEvent};
use crate::metrics::{ConnectionDiagnostics, ConnectionDiagnosticsSnapshot};
use crate::ports::{ConnectionControl, Frame, FrameSink, FrameSource, StateCallback, Transport};
use crate::COMPONENT;

/// State shared between the manager handle and its supervisor.
struct Shared {
    snapshot: watch::Sender<ConnectionSnapshot>,
    outbound: Mutex<Option<mpsc::Sender<String>>>,
    callbacks: Mutex<Vec<StateCallback>>,
    diagnostics: ConnectionDiagnostics,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        self.snapshot.borrow().state
    }

    /// Record liveness without waking watchers.
    fn mark_alive(&self) {
        let now = Utc::now();
        self.snapshot.send_if_modified(|snapshot| {
            snapshot.last_heartbeat_at = Some(now);
            false
        });
    }

    /// Snapshot of the registered callbacks, so none runs under the lock.
    fn callbacks(&self) -> Vec<StateCallback> {
        self.callbacks.lock().clone()
    }

    /// Publish `Disconnected` after the supervisor died without doing so.
    fn force_disconnected(&self, events: &mpsc::Sender<TransportEvent>, reason: String) {
        *self.outbound.lock() = None;
        let from = self.state();
        if from == ConnectionState::Disconnected {
            return;
        }

        let at = Utc::now();
        let mut attempt = 0;
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = ConnectionState::Disconnected;
            snapshot.gave_up = false;
            attempt = snapshot.attempt;
        });
        CONNECTION_TRANSITIONS
            .with_label_values(&[ConnectionState::Disconnected.as_str()])
            .inc();
        CONNECTION_STATE.set(connection_state_ordinal(ConnectionState::Disconnected.as_str()));

        let change = StateChange {
            from,
            to: ConnectionState::Disconnected,
            attempt,
            gave_up: false,
            reason: Some(reason),
            at,
        };
        for callback in self.callbacks() {
            callback(&change);
        }
        let _ = events.try_send(TransportEvent::StateChanged(change));
    }
}

#[derive(Clone)]
struct Target {
    url: String,
    options: ConnectionOptions,
}

#[derive(Default)]
struct Control {
    target: Option<Target>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl Control {
    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

/// Connection Manager - drives one transport connection.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    events: mpsc::Sender<TransportEvent>,
    control: Mutex<Control>,
}

impl ConnectionManager {
    /// Create a manager and the receiving end of its event queue.
    pub fn new(
        transport: Arc<dyn Transport>,
        event_capacity: usize,
    ) -> (Self, mpsc::Receiver<TransportEvent>) {
        let (events, receiver) = mpsc::channel(event_capacity.max(1));
        let (snapshot, _) = watch::channel(ConnectionSnapshot::default());
        let manager = Self {
            transport,
            shared: Arc::new(Shared {
                snapshot,
                outbound: Mutex::new(None),
                callbacks: Mutex::new(Vec::new()),
                diagnostics: ConnectionDiagnostics::new(),
            }),
            events,
            control: Mutex::new(Control::default()),
        };
        (manager, receiver)
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    fn spawn_supervisor(&self, control: &mut Control) -> Result<(), ConnectionError> {
        let target = control.target.clone().ok_or(ConnectionError::NoTarget)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let supervisor = Supervisor {
            session_id: Uuid::new_v4(),
            transport: Arc::clone(&self.transport),
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            backoff: BackoffPolicy::from_options(&target.options),
            retries: RetryTracker::new(target.options.max_attempts),
            target,
            shutdown: shutdown_rx,
        };

        control.shutdown = Some(shutdown_tx);
        control.task = Some(tokio::spawn(supervisor.run()));
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<(), ConnectionError> {
    let parsed = url::Url::parse(url).map_err(|e| ConnectionError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(ConnectionError::InvalidUrl(format!(
            "unsupported scheme '{other}'"
        ))),
    }
}

#[async_trait]
impl ConnectionControl for ConnectionManager {
    fn connect(&self, url: &str, options: ConnectionOptions) -> Result<(), ConnectionError> {
        validate_url(url)?;
        options.validate()?;
        let mut control = self.control.lock();
        if control.is_running() {
            return Err(ConnectionError::AlreadyRunning);
        }
        control.target = Some(Target {
            url: url.to_string(),
            options,
        });
        self.spawn_supervisor(&mut control)
    }

    async fn disconnect(&self) {
        let (shutdown, task) = {
            let mut control = self.control.lock();
            (control.shutdown.take(), control.task.take())
        };
        if let Some(shutdown) = shutdown {
            let _ = shutdown.send(true);
        }
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Connection supervisor ended abnormally");
                self.shared
                    .force_disconnected(&self.events, format!("supervisor failed: {e}"));
            }
        }
    }

    fn retry(&self) -> Result<(), ConnectionError> {
        let mut control = self.control.lock();
        if control.is_running() {
            return Err(ConnectionError::AlreadyRunning);
        }
        log_event!(info, COMPONENT, "Retry requested");
        self.spawn_supervisor(&mut control)
    }

    fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError> {
        if self.shared.state() != ConnectionState::Connected {
            ConnectionDiagnostics::incr(&self.shared.diagnostics.sends_rejected);
            return Err(ConnectionError::NotConnected);
        }
        let frame = message.to_frame()?;

        let outbound = self.shared.outbound.lock();
        let Some(sender) = outbound.as_ref() else {
            ConnectionDiagnostics::incr(&self.shared.diagnostics.sends_rejected);
            return Err(ConnectionError::NotConnected);
        };
        sender.try_send(frame).map_err(|e| {
            ConnectionDiagnostics::incr(&self.shared.diagnostics.sends_rejected);
            match e {
                TrySendError::Full(_) => ConnectionError::OutboundFull,
                TrySendError::Closed(_) => ConnectionError::NotConnected,
            }
        })
    }

    fn on_state_change(&self, callback: StateCallback) {
        self.shared.callbacks.lock().push(callback);
    }

    fn snapshot(&self) -> ConnectionSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.shared.snapshot.subscribe()
    }

    fn diagnostics(&self) -> ConnectionDiagnosticsSnapshot {
        self.shared.diagnostics.snapshot()
    }
}

// =============================================================================
// SUPERVISOR
// =============================================================================

/// How a connect attempt or session ended.
enum Step {
    Shutdown,
    Failed(TransportError),
}

struct Supervisor {
    session_id: Uuid,
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    events: mpsc::Sender<TransportEvent>,
    target: Target,
    backoff: BackoffPolicy,
    retries: RetryTracker,
    shutdown: watch::Receiver<bool>,
}

impl Supervisor {
    async fn run(mut self) {
        log_event!(
            info,
            COMPONENT,
            "Connection supervisor started",
            session = %self.session_id,
            url = %self.target.url,
            transport = self.transport.name()
        );
        self.transition(ConnectionState::Connecting, None, false).await;

        loop {
            let failure = match self.connect_once().await {
                Step::Shutdown => return self.finish_shutdown().await,
                Step::Failed(error) => error,
            };

            match self.retries.next() {
                RetryDecision::Retry { attempt } => {
                    let delay = self.backoff.delay_with(attempt, &mut rand::thread_rng());
                    ConnectionDiagnostics::incr(&self.shared.diagnostics.reconnects_scheduled);
                    RECONNECT_ATTEMPTS.inc();
                    RECONNECT_DELAY.observe(delay.as_secs_f64());

                    self.transition(
                        ConnectionState::Reconnecting,
                        Some(failure.to_string()),
                        false,
                    )
                    .await;
                    debug!(
                        session = %self.session_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Reconnect scheduled"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown.changed() => return self.finish_shutdown().await,
                    }
                    self.transition(ConnectionState::Connecting, None, false).await;
                }
                RetryDecision::GiveUp { attempts } => {
                    let error = ConnectionError::MaxRetriesExceeded { attempts };
                    ConnectionDiagnostics::incr(&self.shared.diagnostics.gave_up);
                    log_event!(
                        warn,
                        COMPONENT,
                        "Giving up on connection",
                        session = %self.session_id,
                        attempts,
                        last_error = %failure
                    );
                    self.transition(ConnectionState::Disconnected, Some(error.to_string()), true)
                        .await;
                    return;
                }
            }
        }
    }

    async fn finish_shutdown(&mut self) {
        self.transition(
            ConnectionState::Disconnected,
            Some("client disconnect".to_string()),
            false,
        )
        .await;
    }

    async fn connect_once(&mut self) -> Step {
        ConnectionDiagnostics::incr(&self.shared.diagnostics.connect_attempts);

        let opened = tokio::select! {
            result = self.transport.open(&self.target.url) => result,
            _ = self.shutdown.changed() => return Step::Shutdown,
        };

        match opened {
            Err(error) => {
                ConnectionDiagnostics::incr(&self.shared.diagnostics.connect_failures);
                log_event!(
                    warn,
                    COMPONENT,
                    "Connect attempt failed",
                    session = %self.session_id,
                    attempt = self.retries.attempt(),
                    error = %error
                );
                Step::Failed(error)
            }
            Ok((sink, source)) => {
                ConnectionDiagnostics::incr(&self.shared.diagnostics.connects_succeeded);
                self.retries.reset();
                // The queue exists before Connected is published, so observers
                // of the transition can send immediately.
                let capacity = self.target.options.outbound_capacity.max(1);
                let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
                *self.shared.outbound.lock() = Some(outbound_tx);
                self.transition(ConnectionState::Connected, None, false).await;
                self.run_session(sink, source, outbound_rx).await
            }
        }
    }

    async fn run_session(
        &mut self,
        mut sink: Box<dyn FrameSink>,
        mut source: Box<dyn FrameSource>,
        mut outbound_rx: mpsc::Receiver<String>,
    ) -> Step {
        let options = &self.target.options;
        self.shared.mark_alive();

        let interval = options.heartbeat_interval();
        let timeout = options.heartbeat_timeout();
        let mut heartbeat = tokio::time::interval_at(Instant::now() + interval, interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut awaiting_since: Option<Instant> = None;

        let step = loop {
            let deadline = awaiting_since.unwrap_or_else(Instant::now) + timeout;

            tokio::select! {
                _ = self.shutdown.changed() => {
                    let _ = sink.close().await;
                    break Step::Shutdown;
                }
                frame = source.next_frame() => {
                    let frame = match frame {
                        Some(Ok(frame)) => frame,
                        Some(Err(error)) => break Step::Failed(error),
                        None => break Step::Failed(TransportError::Closed),
                    };
                    awaiting_since = None;
                    self.shared.mark_alive();
                    ConnectionDiagnostics::incr(&self.shared.diagnostics.frames_received);

                    match frame {
                        Frame::Text(text) => {
                            if self.events.send(TransportEvent::Frame(text)).await.is_err() {
                                let _ = sink.close().await;
                                break Step::Shutdown;
                            }
                        }
                        Frame::Ping(data) => {
                            if let Err(error) = sink.send(Frame::Pong(data)).await {
                                break Step::Failed(error);
                            }
                        }
                        Frame::Pong(_) => {}
                        Frame::Close => break Step::Failed(TransportError::Closed),
                    }
                }
                Some(text) = outbound_rx.recv() => {
                    if let Err(error) = sink.send(Frame::Text(text)).await {
                        break Step::Failed(error);
                    }
                    ConnectionDiagnostics::incr(&self.shared.diagnostics.frames_sent);
                }
                _ = heartbeat.tick() => {
                    match ClientMessage::heartbeat(Utc::now()).to_frame() {
                        Ok(ping) => {
                            if let Err(error) = sink.send(Frame::Text(ping)).await {
                                break Step::Failed(error);
                            }
                        }
                        Err(error) => warn!(error = %error, "Failed to encode heartbeat"),
                    }
                    if awaiting_since.is_none() {
                        awaiting_since = Some(Instant::now());
                    }
                }
                _ = tokio::time::sleep_until(deadline), if awaiting_since.is_some() => {
                    ConnectionDiagnostics::incr(&self.shared.diagnostics.heartbeat_timeouts);
                    break Step::Failed(TransportError::HeartbeatTimeout(timeout));
                }
            }
        };

        *self.shared.outbound.lock() = None;
        if let Step::Failed(error) = &step {
            ConnectionDiagnostics::incr(&self.shared.diagnostics.session_failures);
            log_event!(
                warn,
                COMPONENT,
                "Connection lost",
                session = %self.session_id,
                error = %error
            );
        }
        step
    }

    async fn transition(&mut self, to: ConnectionState, reason: Option<String>, gave_up: bool) {
        let from = self.shared.state();
        if !from.can_transition_to(to) {
            warn!(%from, %to, "Ignoring illegal connection transition");
            return;
        }

        let attempt = self.retries.attempt();
        let at = Utc::now();
        self.shared.snapshot.send_modify(|snapshot| {
            snapshot.state = to;
            snapshot.attempt = attempt;
            snapshot.gave_up = gave_up;
            if to == ConnectionState::Connected {
                snapshot.last_heartbeat_at = Some(at);
            }
        });

        CONNECTION_TRANSITIONS.with_label_values(&[to.as_str()]).inc();
        CONNECTION_STATE.set(connection_state_ordinal(to.as_str()));
        log_event!(
            info,
            COMPONENT,
            "Connection state changed",
            session = %self.session_id,
            from = %from,
            to = %to,
            attempt,
            gave_up
        );

        let change = StateChange {
            from,
            to,
            attempt,
            gave_up,
            reason,
            at,
        };
        for callback in self.shared.callbacks() {
            callback(&change);
        }
        let _ = self.events.send(TransportEvent::StateChanged(change)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockOutcome, MockTransport};
    use crate::ports::TransportPair;
    use shared_types::{Channel, ClientOp};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const URL: &str = "ws://sync.test/socket";

    fn new_manager(
        transport: &MockTransport,
    ) -> (ConnectionManager, mpsc::Receiver<TransportEvent>) {
        ConnectionManager::new(Arc::new(transport.clone()), 256)
    }

    async fn wait_for_state(manager: &ConnectionManager, state: ConnectionState) {
        let mut rx = manager.watch();
        rx.wait_for(|snapshot| snapshot.state == state)
            .await
            .unwrap();
    }

    fn drain_changes(events: &mut mpsc::Receiver<TransportEvent>) -> Vec<StateChange> {
        let mut changes = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let TransportEvent::StateChanged(change) = event {
                changes.push(change);
            }
        }
        changes
    }

    #[tokio::test]
    async fn test_send_while_disconnected_fails_fast() {
        let (transport, _server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);

        let result = manager.send(&ClientMessage::heartbeat(Utc::now()));
        assert_eq!(result, Err(ConnectionError::NotConnected));
        assert_eq!(manager.diagnostics().sends_rejected, 1);
    }

    #[tokio::test]
    async fn test_rejects_non_websocket_url() {
        let (transport, _server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);

        let result = manager.connect("http://sync.test", ConnectionOptions::for_testing());
        assert!(matches!(result, Err(ConnectionError::InvalidUrl(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_and_forwards_frames_in_order() {
        let (transport, mut server) = MockTransport::new();
        let (manager, mut events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let conn = server.accept().await.unwrap();
        conn.send_text("{\"hello\":1}");

        let mut seen = Vec::new();
        while seen.len() < 3 {
            seen.push(events.recv().await.unwrap());
        }

        assert!(matches!(&seen[0], TransportEvent::StateChanged(c) if c.to == ConnectionState::Connecting));
        assert!(matches!(&seen[1], TransportEvent::StateChanged(c) if c.to == ConnectionState::Connected));
        assert_eq!(seen[2], TransportEvent::Frame("{\"hello\":1}".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_reaches_server_when_connected() {
        let (transport, mut server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let mut conn = server.accept().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        manager
            .send(&ClientMessage::subscribe(Channel::repair(42), Utc::now()))
            .unwrap();

        let message = conn.recv_message().await.unwrap();
        assert_eq!(message.op, ClientOp::Subscribe);
        assert_eq!(message.channel, Some(Channel::repair(42)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_five_retries() {
        let (transport, _server) = MockTransport::new();
        transport.fail_all();
        let (manager, mut events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let mut rx = manager.watch();
        rx.wait_for(|snapshot| snapshot.gave_up).await.unwrap();

        // One initial connect plus five retries.
        assert_eq!(transport.opens(), 6);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(transport.opens(), 6);

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.state, ConnectionState::Disconnected);
        assert!(snapshot.is_offline_terminal());

        let changes = drain_changes(&mut events);
        let reconnecting = changes
            .iter()
            .filter(|c| c.to == ConnectionState::Reconnecting)
            .count();
        assert_eq!(reconnecting, 5);
        let last = changes.last().unwrap();
        assert!(last.gave_up);
        assert_eq!(last.attempt, 5);
        assert_eq!(manager.diagnostics().gave_up, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_connect_resets_attempt() {
        let (transport, mut server) = MockTransport::new();
        transport.push_outcome(MockOutcome::Fail("refused".into()));
        transport.push_outcome(MockOutcome::Fail("refused".into()));
        let (manager, _events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let _conn = server.accept().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;

        assert_eq!(transport.opens(), 3);
        assert_eq!(manager.snapshot().attempt, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_timeout_forces_reconnect() {
        let (transport, mut server) = MockTransport::new();
        let (manager, mut events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let mut silent = server.accept().await.unwrap();

        let ping = silent.recv_message().await.unwrap();
        assert_eq!(ping.op, ClientOp::Heartbeat);

        let _second = server.accept().await.unwrap();
        assert_eq!(transport.opens(), 2);
        assert_eq!(manager.diagnostics().heartbeat_timeouts, 1);

        let changes = drain_changes(&mut events);
        let lost = changes
            .iter()
            .find(|c| c.to == ConnectionState::Reconnecting)
            .unwrap();
        assert!(lost.reason.as_deref().unwrap_or_default().contains("Heartbeat"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_traffic_keeps_connection_alive() {
        let (transport, mut server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let mut conn = server.accept().await.unwrap();
        tokio::spawn(async move {
            while let Some(message) = conn.recv_message().await {
                if message.op == ClientOp::Heartbeat {
                    conn.send_text(
                        r#"{"type":"heartbeat_ack","channel":"system","payload":{},"ts":"2024-05-01T10:00:00Z"}"#,
                    );
                }
            }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(transport.opens(), 1);
        assert!(manager.snapshot().last_heartbeat_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let (transport, _server) = MockTransport::new();
        transport.fail_all();
        let (manager, _events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        wait_for_state(&manager, ConnectionState::Reconnecting).await;
        let opens_before = transport.opens();

        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.snapshot().gave_up);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.opens(), opens_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_give_up() {
        let (transport, mut server) = MockTransport::new();
        transport.fail_all();
        let (manager, _events) = new_manager(&transport);
        let options = ConnectionOptions {
            max_attempts: 1,
            ..ConnectionOptions::for_testing()
        };

        manager.connect(URL, options).unwrap();
        manager
            .watch()
            .wait_for(|snapshot| snapshot.gave_up)
            .await
            .unwrap();

        transport.set_fallback(MockOutcome::Accept);
        manager.retry().unwrap();
        let _conn = server.accept().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        assert!(!manager.snapshot().gave_up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_twice_is_rejected() {
        let (transport, _server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let second = manager.connect(URL, ConnectionOptions::for_testing());
        assert_eq!(second, Err(ConnectionError::AlreadyRunning));
        manager.disconnect().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_callbacks_observe_transitions() {
        let (transport, mut server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        manager.on_state_change(Arc::new(move |_: &StateChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let _conn = server.accept().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        manager.disconnect().await;

        // connecting, connected, disconnected
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_without_target() {
        let (transport, _server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);
        assert_eq!(manager.retry(), Err(ConnectionError::NoTarget));
    }

    /// Transport whose open never returns normally.
    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn open(&self, _url: &str) -> Result<TransportPair, TransportError> {
            panic!("transport exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_heartbeat_interval_is_rejected() {
        let (transport, _server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);
        let options = ConnectionOptions {
            heartbeat_interval_ms: 0,
            ..ConnectionOptions::for_testing()
        };

        let result = manager.connect(URL, options);
        assert!(matches!(result, Err(ConnectionError::InvalidOptions(_))));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(transport.opens(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_after_supervisor_panic_reports_disconnected() {
        let (manager, mut events) = ConnectionManager::new(Arc::new(PanickingTransport), 16);

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        wait_for_state(&manager, ConnectionState::Connecting).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.disconnect().await;

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.snapshot().gave_up);
        let changes = drain_changes(&mut events);
        let last = changes.last().unwrap();
        assert_eq!(last.from, ConnectionState::Connecting);
        assert_eq!(last.to, ConnectionState::Disconnected);
        assert_eq!(
            manager.send(&ClientMessage::heartbeat(Utc::now())),
            Err(ConnectionError::NotConnected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_register_another_callback() {
        let (transport, mut server) = MockTransport::new();
        let (manager, _events) = new_manager(&transport);
        let manager = Arc::new(manager);
        let nested = Arc::new(AtomicUsize::new(0));

        let handle = Arc::downgrade(&manager);
        let counter = Arc::clone(&nested);
        manager.on_state_change(Arc::new(move |change: &StateChange| {
            if change.to != ConnectionState::Connected {
                return;
            }
            if let Some(manager) = handle.upgrade() {
                let counter = Arc::clone(&counter);
                manager.on_state_change(Arc::new(move |_: &StateChange| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }));

        manager.connect(URL, ConnectionOptions::for_testing()).unwrap();
        let _conn = server.accept().await.unwrap();
        wait_for_state(&manager, ConnectionState::Connected).await;
        manager.disconnect().await;

        // Registered on connected, observes disconnected.
        assert_eq!(nested.load(Ordering::SeqCst), 1);
    }
}
