//! # Integration Test Flows
//!
//! Drives a full `SyncClient` against the scripted mock transport.
//!
//! ## Flows Tested:
//!
//! 1. **Subscribe → route → reconcile**: a subscribed channel's deltas reach
//!    the entity store and the change stream; stale deltas do not.
//! 2. **Channel gate**: traffic for channels nobody subscribed is dropped.
//! 3. **Ref-counted guards**: one transport subscribe per channel, one
//!    unsubscribe when the last guard goes.
//! 4. **Reconnect replay**: every active channel is re-announced.
//! 5. **Notifications**: dedup, optimistic read, server correction.
//! 6. **Expiration**: non-persistent items go, persistent ones stay.
//! 7. **Give up and retry**.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use serde_json::{json, Value};
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use rt_01_connection::{MockConnection, MockOutcome, MockServer, MockTransport};
    use rt_05_notifications::{
        FixedClock, PlatformCapabilities, RecordingAlertSink, StaticPermissions,
    };
    use shared_bus::{AlertEvent, EventStream, SyncEvent};
    use shared_types::{
        ChangeOp, Channel, ClientMessage, ClientOp, ConnectionState, EntityKind, InboundMessage,
        MessageType, RepairStatus, Timestamp,
    };
    use sync_runtime::{SyncClient, SyncConfig};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const WAIT: Duration = Duration::from_secs(5);

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn at(secs: i64) -> String {
        (t0() + ChronoDuration::seconds(secs)).to_rfc3339()
    }

    struct Harness {
        client: SyncClient,
        transport: MockTransport,
        server: MockServer,
        alerts: RecordingAlertSink,
        clock: Arc<FixedClock>,
    }

    fn harness() -> Harness {
        let (transport, server) = MockTransport::new();
        let mut config = SyncConfig::for_testing("ws://sync.test/socket");
        // Keep heartbeats out of the way of the flows under test.
        config.connection.heartbeat_interval_ms = 60_000;
        config.connection.heartbeat_timeout_ms = 30_000;
        // Sweeps run only when a test asks for one.
        config.sweeper.interval = Duration::from_secs(3_600);

        let alerts = RecordingAlertSink::new();
        let clock = Arc::new(FixedClock::new(t0()));
        let client = SyncClient::builder(config)
            .transport(Arc::new(transport.clone()))
            .alert_sink(Arc::new(alerts.clone()))
            .permissions(Arc::new(StaticPermissions::granted()))
            .clock(clock.clone())
            .capabilities(PlatformCapabilities::full())
            .build();

        Harness {
            client,
            transport,
            server,
            alerts,
            clock,
        }
    }

    async fn start(h: &mut Harness) -> MockConnection {
        h.client.start().unwrap();
        let conn = timeout(WAIT, h.server.accept()).await.unwrap().unwrap();
        let mut watch = h.client.watch_connection();
        timeout(WAIT, watch.wait_for(|s| s.state == ConnectionState::Connected))
            .await
            .unwrap()
            .unwrap();
        conn
    }

    fn frame(message_type: MessageType, channel: Channel, payload: Value) -> String {
        InboundMessage {
            message_type,
            channel,
            payload,
            ts: t0(),
            sequence: None,
        }
        .to_frame()
        .unwrap()
    }

    /// Next non-heartbeat message the client wrote.
    async fn next_op(conn: &mut MockConnection) -> ClientMessage {
        loop {
            let message = timeout(WAIT, conn.recv_message()).await.unwrap().unwrap();
            if message.op != ClientOp::Heartbeat {
                return message;
            }
        }
    }

    async fn next_event(stream: &mut EventStream) -> SyncEvent {
        timeout(WAIT, stream.next()).await.unwrap().unwrap()
    }

    // =============================================================================
    // SUBSCRIBE → ROUTE → RECONCILE
    // =============================================================================

    #[tokio::test]
    async fn test_subscribed_updates_reach_store_and_stream() {
        let mut h = harness();
        let mut conn = start(&mut h).await;
        let channel = Channel::repair(42);

        let _guard = h.client.subscribe(channel.clone()).await.unwrap();
        let announced = next_op(&mut conn).await;
        assert_eq!(announced.op, ClientOp::Subscribe);
        assert_eq!(announced.channel, Some(channel.clone()));

        let mut changes = h.client.on_entity_change(EntityKind::RepairProgress);
        conn.send_text(frame(
            MessageType::RepairProgress,
            channel.clone(),
            json!({ "id": "42", "updated_at": at(10), "status": "diagnosing", "progress_percent": 10 }),
        ));
        match next_event(&mut changes).await {
            SyncEvent::EntityChanged(change) => {
                assert_eq!(change.id, "42");
                assert_eq!(change.op, ChangeOp::Inserted);
            }
            other => panic!("unexpected event {other:?}"),
        }

        // Older than what is stored: rejected without an event.
        conn.send_text(frame(
            MessageType::RepairProgress,
            channel.clone(),
            json!({ "id": "42", "updated_at": at(5), "status": "completed" }),
        ));
        conn.send_text(frame(
            MessageType::RepairProgress,
            channel,
            json!({ "id": "42", "updated_at": at(20), "status": "in_repair", "progress_percent": 50 }),
        ));
        match next_event(&mut changes).await {
            SyncEvent::EntityChanged(change) => assert_eq!(change.op, ChangeOp::Updated),
            other => panic!("unexpected event {other:?}"),
        }

        let repair = h.client.repair_progress("42").unwrap();
        assert_eq!(repair.status, RepairStatus::InRepair);
        assert_eq!(repair.progress_percent, 50);

        let diagnostics = h.client.diagnostics().await.unwrap();
        assert_eq!(diagnostics.reconciler.rejected_stale, 1);
        assert_eq!(diagnostics.router.delivered, 3);
    }

    #[tokio::test]
    async fn test_unsubscribed_channel_traffic_is_dropped() {
        let mut h = harness();
        let conn = start(&mut h).await;
        let _guard = h.client.subscribe(Channel::repair(1)).await.unwrap();
        let mut changes = h.client.on_entity_change(EntityKind::RepairProgress);

        conn.send_text(frame(
            MessageType::RepairProgress,
            Channel::repair(7),
            json!({ "id": "7", "updated_at": at(1) }),
        ));
        conn.send_text("{ definitely not json");
        conn.send_text(frame(
            MessageType::Unknown("loyalty_points".into()),
            Channel::repair(1),
            json!({}),
        ));
        conn.send_text(frame(MessageType::HeartbeatAck, Channel::new("system"), json!({})));
        conn.send_text(frame(
            MessageType::RepairProgress,
            Channel::repair(1),
            json!({ "id": "1", "updated_at": at(1) }),
        ));

        // The last frame is processed after everything before it.
        match next_event(&mut changes).await {
            SyncEvent::EntityChanged(change) => assert_eq!(change.id, "1"),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(h.client.repair_progress("7").is_none());

        let router = h.client.diagnostics().await.unwrap().router;
        assert_eq!(router.unsubscribed, 1);
        assert_eq!(router.malformed, 1);
        assert_eq!(router.unknown_type, 1);
        assert_eq!(router.control, 1);
        // The heartbeat ack and the repair update.
        assert_eq!(router.delivered, 2);
    }

    // =============================================================================
    // REF-COUNTED SUBSCRIPTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_last_guard_drop_unsubscribes_once() {
        let mut h = harness();
        let mut conn = start(&mut h).await;
        let channel = Channel::photos(42);

        let first = h.client.subscribe(channel.clone()).await.unwrap();
        let second = h.client.subscribe(channel.clone()).await.unwrap();
        assert_eq!(next_op(&mut conn).await.op, ClientOp::Subscribe);

        drop(first);
        assert_eq!(h.client.active_channels().await.unwrap(), vec![channel.clone()]);
        assert!(conn.drain_messages().is_empty());

        second.unsubscribe().await.unwrap();
        let message = next_op(&mut conn).await;
        assert_eq!(message.op, ClientOp::Unsubscribe);
        assert_eq!(message.channel, Some(channel));
        assert!(h.client.active_channels().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_channel_reconciles_until_last_consumer_leaves() {
        let mut h = harness();
        let conn = start(&mut h).await;
        let shared = Channel::repair(42);
        let first = h.client.subscribe(shared.clone()).await.unwrap();
        let second = h.client.subscribe(shared.clone()).await.unwrap();
        let _other = h.client.subscribe(Channel::repair(1)).await.unwrap();
        let mut changes = h.client.on_entity_change(EntityKind::RepairProgress);

        // One consumer leaves; the other still receives updates.
        drop(first);
        assert!(h.client.active_channels().await.unwrap().contains(&shared));
        conn.send_text(frame(
            MessageType::RepairProgress,
            shared.clone(),
            json!({ "id": "42", "updated_at": at(10), "status": "diagnosing" }),
        ));
        match next_event(&mut changes).await {
            SyncEvent::EntityChanged(change) => assert_eq!(change.id, "42"),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            h.client.repair_progress("42").unwrap().status,
            RepairStatus::Diagnosing
        );

        // After the last one leaves, late frames for the channel are dropped.
        second.unsubscribe().await.unwrap();
        conn.send_text(frame(
            MessageType::RepairProgress,
            shared,
            json!({ "id": "42", "updated_at": at(20), "status": "completed" }),
        ));
        conn.send_text(frame(
            MessageType::RepairProgress,
            Channel::repair(1),
            json!({ "id": "1", "updated_at": at(20) }),
        ));
        match next_event(&mut changes).await {
            SyncEvent::EntityChanged(change) => assert_eq!(change.id, "1"),
            other => panic!("unexpected event {other:?}"),
        }

        assert_eq!(
            h.client.repair_progress("42").unwrap().status,
            RepairStatus::Diagnosing
        );
        let router = h.client.diagnostics().await.unwrap().router;
        assert_eq!(router.unsubscribed, 1);
        assert_eq!(router.delivered, 2);
    }

    #[tokio::test]
    async fn test_reconnect_replays_active_channels() {
        let mut h = harness();
        let mut conn = start(&mut h).await;
        let _a = h.client.subscribe(Channel::repair(1)).await.unwrap();
        let _b = h.client.subscribe(Channel::notifications(7)).await.unwrap();
        next_op(&mut conn).await;
        next_op(&mut conn).await;

        // Server drops the connection; the manager reconnects after backoff.
        drop(conn);
        let mut conn = timeout(WAIT, h.server.accept()).await.unwrap().unwrap();

        let replayed: BTreeSet<Channel> = [next_op(&mut conn).await, next_op(&mut conn).await]
            .into_iter()
            .inspect(|m| assert_eq!(m.op, ClientOp::Subscribe))
            .filter_map(|m| m.channel)
            .collect();
        assert_eq!(
            replayed,
            BTreeSet::from([Channel::repair(1), Channel::notifications(7)])
        );
        assert_eq!(h.transport.opens(), 2);
    }

    // =============================================================================
    // NOTIFICATIONS
    // =============================================================================

    #[tokio::test]
    async fn test_notification_dedup_read_and_server_correction() {
        let mut h = harness();
        let conn = start(&mut h).await;
        let channel = Channel::notifications(7);
        let _guard = h.client.subscribe(channel.clone()).await.unwrap();
        let mut alerts = h.client.on_alert();

        conn.send_text(frame(
            MessageType::Notification,
            channel.clone(),
            json!({ "id": "n1", "updated_at": at(1), "title": "Diagnosing", "priority": "high" }),
        ));
        conn.send_text(frame(
            MessageType::Notification,
            channel.clone(),
            json!({ "id": "n1", "updated_at": at(2), "title": "Parts ordered" }),
        ));

        assert!(matches!(
            next_event(&mut alerts).await,
            SyncEvent::Alert(AlertEvent::Shown { intrusive: true, .. })
        ));
        assert!(matches!(
            next_event(&mut alerts).await,
            SyncEvent::Alert(AlertEvent::Updated { .. })
        ));
        assert_eq!(h.alerts.shown_count(), 1);
        let active = h.client.active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Parts ordered");

        // Optimistic read dismisses the alert immediately.
        let result = h.client.mark_notification_read("n1").unwrap();
        assert!(result.applied);
        assert!(h.client.notification("n1").unwrap().read);
        assert!(h.client.active_alerts().is_empty());

        // The server's answer replaces the local guess.
        let mut changes = h.client.on_entity_change(EntityKind::Notification);
        conn.send_text(frame(
            MessageType::Notification,
            channel,
            json!({ "id": "n1", "updated_at": at(30), "read": false }),
        ));
        next_event(&mut changes).await;
        assert!(!h.client.notification("n1").unwrap().read);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_non_persistent_expired() {
        let mut h = harness();
        let conn = start(&mut h).await;
        let channel = Channel::notifications(7);
        let _guard = h.client.subscribe(channel.clone()).await.unwrap();
        let mut changes = h.client.on_entity_change(EntityKind::Notification);

        for (id, persistent) in [("promo", false), ("invoice", true)] {
            conn.send_text(frame(
                MessageType::Notification,
                channel.clone(),
                json!({ "id": id, "updated_at": at(1), "title": id, "expires_at": at(60), "persistent": persistent }),
            ));
            next_event(&mut changes).await;
        }

        h.clock.advance(ChronoDuration::minutes(5));
        let report = h.client.sweep_expired();

        assert_eq!(report.ids(EntityKind::Notification), vec!["promo".to_string()]);
        assert!(h.client.notification("promo").is_none());
        assert!(h.client.notification("invoice").is_some());
        assert!(matches!(
            next_event(&mut changes).await,
            SyncEvent::EntitiesExpired { .. }
        ));
        assert_eq!(h.client.active_alerts().len(), 1);
    }

    // =============================================================================
    // GIVE UP AND RETRY
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_then_retries_on_request() {
        let mut h = harness();
        h.transport.fail_all();
        h.client.start().unwrap();

        let mut watch = h.client.watch_connection();
        let snapshot = timeout(Duration::from_secs(600), watch.wait_for(|s| s.gave_up))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert_eq!(snapshot.state, ConnectionState::Disconnected);
        assert_eq!(h.transport.opens(), 6);

        h.transport.set_fallback(MockOutcome::Accept);
        h.client.retry().unwrap();
        let _conn = timeout(WAIT, h.server.accept()).await.unwrap().unwrap();
        timeout(WAIT, watch.wait_for(|s| s.state == ConnectionState::Connected))
            .await
            .unwrap()
            .unwrap();
        assert!(!h.client.connection_snapshot().gave_up);

        h.client.shutdown().await;
        assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
    }
}
