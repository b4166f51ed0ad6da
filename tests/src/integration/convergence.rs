//! # Ordering Guarantees
//!
//! Router and reconciler wired together without a transport. Two clients
//! that receive the same full-state deltas in different orders, with
//! duplicates, end up with identical stores.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    use rt_03_message_router::{DispatchOutcome, MessageRouter, RouteError, RouterConfig};
    use rt_04_state_reconciler::{ReconcilerApi, StateReconciler};
    use shared_types::{Channel, InboundMessage, MessageType, RepairProgress};

    fn message(id: &str, secs: i64, percent: u8) -> InboundMessage {
        let ts = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        InboundMessage {
            message_type: MessageType::RepairProgress,
            channel: Channel::repair(id),
            payload: json!({
                "id": id,
                "updated_at": ts.to_rfc3339(),
                "status": "in_repair",
                "progress_percent": percent,
                "notes": format!("{id}@{secs}"),
            }),
            ts,
            sequence: None,
        }
    }

    fn wired() -> (MessageRouter, Arc<StateReconciler>) {
        let reconciler = Arc::new(StateReconciler::new());
        let mut router = MessageRouter::new(RouterConfig::default());
        let store = Arc::clone(&reconciler);
        router.register_for_channel(
            MessageType::RepairProgress,
            "repair:*",
            move |message: &InboundMessage| -> Result<(), RouteError> {
                store
                    .apply_message(message)
                    .map(|_| ())
                    .map_err(|e| RouteError::Handler(e.to_string()))
            },
        );
        (router, reconciler)
    }

    fn deliver(messages: &[InboundMessage]) -> Vec<RepairProgress> {
        let (mut router, reconciler) = wired();
        let gate = |_: &Channel| true;
        for message in messages {
            let outcome = router.dispatch(message, &gate);
            assert!(outcome.is_delivered(), "{outcome:?}");
        }
        reconciler.snapshot::<RepairProgress>()
    }

    #[test]
    fn test_reverse_order_converges() {
        let messages = vec![
            message("1", 1, 10),
            message("1", 2, 20),
            message("2", 1, 5),
            message("1", 3, 30),
        ];
        let mut reversed = messages.clone();
        reversed.reverse();

        let forward = deliver(&messages);
        assert_eq!(forward, deliver(&reversed));
        assert_eq!(forward[0].progress_percent, 30);
    }

    #[test]
    fn test_handler_failure_is_isolated() {
        let (mut router, reconciler) = wired();
        let gate = |_: &Channel| true;
        let mut broken = message("1", 1, 10);
        broken.payload = json!({ "id": "1" });

        let outcome = router.dispatch(&broken, &gate);
        assert_eq!(
            outcome,
            DispatchOutcome::Delivered {
                handlers: 1,
                failures: 1
            }
        );
        assert!(router.dispatch(&message("1", 2, 20), &gate).is_delivered());
        assert_eq!(reconciler.snapshot::<RepairProgress>().len(), 1);
        assert_eq!(router.diagnostics().handler_errors, 1);
    }

    proptest! {
        #[test]
        fn shuffled_duplicated_delivery_converges(
            updates in proptest::collection::vec((0u8..4, 0i64..50), 1..30),
            seed in any::<u64>(),
        ) {
            let messages: Vec<InboundMessage> = updates
                .iter()
                // Equal timestamps keep the first write, so content follows the timestamp.
                .map(|(id, secs)| message(&id.to_string(), *secs, (*secs * 2) as u8))
                .collect();

            // Deterministic shuffle plus every message delivered twice.
            let mut shuffled: Vec<InboundMessage> =
                messages.iter().chain(messages.iter()).cloned().collect();
            let mut state = seed | 1;
            for i in (1..shuffled.len()).rev() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                shuffled.swap(i, (state % (i as u64 + 1)) as usize);
            }

            prop_assert_eq!(deliver(&messages), deliver(&shuffled));
        }
    }
}
