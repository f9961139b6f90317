//! # Ledger → Bus → Listener Flows
//!
//! Drives the record ledger through its chaincode dispatcher and checks what
//! reaches the event bus, the alert sink and the JSONL event log.
//!
//! ## Flow Tested
//!
//! 1. **Commit then emit**: committed operations publish their events in order
//! 2. **No partial application**: rejected operations publish nothing
//! 3. **Listener rendering**: every channel produces its alert and one log line

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    use serde_json::Value;
    use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
    use shared_types::entities::RecordStatus;
    use shared_types::events::{channels, RecordEvent};
    use shared_types::identity::Identity;

    use ecg_01_record_ledger::prelude::*;
    use ecg_02_alert_listener::prelude::*;

    type Ledger = RecordService<InMemoryRecordStore, BusEventSink<InMemoryEventBus>>;

    const ADMIN: &str = "x509::CN=admin";
    const ALICE: &str = "x509::CN=alice";
    const BOB: &str = "x509::CN=bob";
    const EVE: &str = "x509::CN=eve";
    const VERIFIER: &str = "x509::CN=verifier";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Fixture {
        bus: Arc<InMemoryEventBus>,
        dispatcher: ChaincodeDispatcher<Arc<Ledger>>,
    }

    impl Fixture {
        fn new() -> Self {
            let bus = Arc::new(InMemoryEventBus::new());
            let ledger = Arc::new(RecordService::new(
                InMemoryRecordStore::new(),
                BusEventSink::new(bus.clone(), DEFAULT_CONTRACT_NAME),
                LedgerPolicy::default(),
            ));
            Self {
                bus,
                dispatcher: ChaincodeDispatcher::new(ledger),
            }
        }

        fn raw_subscription(&self) -> Subscription {
            self.bus.subscribe(EventFilter::contract(DEFAULT_CONTRACT_NAME))
        }

        fn call(&self, who: &str, function: &str, args: &[&str]) -> Result<String, RecordError> {
            let ctx = TxContext::now(Identity::new(who));
            self.dispatcher.invoke(&ctx, function, args)
        }

        fn store_and_confirm(&self, patient_id: &str, owner: &str) {
            self.call(
                ADMIN,
                "storeRecord",
                &[
                    patient_id,
                    "QmHash",
                    "2025-06-02T10:30:00Z",
                    r#"{"hospital":"A","doctor":"B"}"#,
                    owner,
                ],
            )
            .unwrap();
            self.call(VERIFIER, "confirmRecord", &[patient_id, "true", "checked"])
                .unwrap();
        }
    }

    fn drain(sub: &mut Subscription) -> Vec<RecordEvent> {
        let mut events = Vec::new();
        while let Some(event) = sub.try_recv().unwrap() {
            events.push(event.decode().unwrap());
        }
        events
    }

    // =============================================================================
    // INTEGRATION TESTS: LEDGER → EVENT BUS
    // =============================================================================

    /// Every committed operation publishes its events, in commit order.
    #[test]
    fn test_committed_operations_publish_in_order() {
        let f = Fixture::new();
        let mut sub = f.raw_subscription();

        f.store_and_confirm("p1", ALICE);
        f.call(ALICE, "grantAccess", &["p1", BOB]).unwrap();
        f.call(BOB, "accessRecord", &["p1"]).unwrap();
        f.call(ALICE, "revokeAccess", &["p1", BOB]).unwrap();

        let published: Vec<_> = drain(&mut sub).iter().map(RecordEvent::channel).collect();
        assert_eq!(
            published,
            vec![
                channels::RECORD_STORED,
                channels::VERIFICATION_REQUESTED,
                channels::VERIFICATION_COMPLETED,
                channels::ACCESS_GRANTED,
                channels::DATA_ACCESSED,
                channels::ACCESS_REVOKED,
            ]
        );
    }

    /// Rejected operations leave no trace on the bus.
    #[test]
    fn test_rejected_operations_publish_nothing() {
        let f = Fixture::new();
        f.store_and_confirm("p1", ALICE);
        let mut sub = f.raw_subscription();

        assert!(matches!(
            f.call(EVE, "accessRecord", &["p1"]),
            Err(RecordError::Unauthorized { .. })
        ));
        assert!(matches!(
            f.call(EVE, "grantAccess", &["p1", EVE]),
            Err(RecordError::Unauthorized { .. })
        ));
        assert!(matches!(
            f.call(VERIFIER, "confirmRecord", &["p1", "true", "again"]),
            Err(RecordError::InvalidState { .. })
        ));
        assert!(f.call(ALICE, "revokeAccess", &["p1", BOB]).is_err());

        assert!(drain(&mut sub).is_empty());
    }

    /// The stored-record event carries the metadata excerpt and both identities.
    #[test]
    fn test_record_stored_payload_contents() {
        let f = Fixture::new();
        let mut sub = f.raw_subscription();
        f.call(
            ADMIN,
            "storeRecord",
            &["p1", "QmHash", "2025-06-02T10:30:00Z", r#"{"hospital":"A","doctor":"B"}"#, ALICE],
        )
        .unwrap();

        match drain(&mut sub).remove(0) {
            RecordEvent::RecordStored(p) => {
                assert_eq!(p.patient_id, "p1");
                assert_eq!(p.content_hash, "QmHash");
                assert_eq!(p.status, RecordStatus::PendingVerification);
                assert_eq!(p.hospital.as_deref(), Some("A"));
                assert_eq!(p.doctor.as_deref(), Some("B"));
                assert_eq!(p.input_by, Identity::new(ADMIN));
                assert_eq!(p.owner, Identity::new(ALICE));
            }
            other => panic!("expected RecordStored, got {other:?}"),
        }
    }

    /// Round trip: store, confirm, grant doc1, access as doc1.
    #[test]
    fn test_round_trip_grant_then_access() {
        let f = Fixture::new();
        f.store_and_confirm("p1", ALICE);
        f.call(ALICE, "grantAccess", &["p1", "x509::CN=doc1"]).unwrap();

        let access: Value =
            serde_json::from_str(&f.call("x509::CN=doc1", "accessRecord", &["p1"]).unwrap())
                .unwrap();
        assert_eq!(access["status"], "CONFIRMED");
        assert_eq!(access["contentHash"], "QmHash");

        let trail: Value =
            serde_json::from_str(&f.call(ALICE, "getAuditTrail", &["p1"]).unwrap()).unwrap();
        assert_eq!(trail["authorizedUsers"], serde_json::json!(["x509::CN=doc1"]));
        assert_eq!(trail["accessHistory"].as_array().unwrap().len(), 1);
    }

    // =============================================================================
    // INTEGRATION TESTS: EVENT BUS → ALERT LISTENER
    // =============================================================================

    /// A listener on the bus renders one alert and one log line per event.
    #[tokio::test]
    async fn test_listener_alerts_and_logs_full_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let f = Fixture::new();

        let sink = Arc::new(CollectingAlertSink::new());
        let listener = AlertListener::new(
            f.bus.subscribe(ListenerConfig::default().filter()),
            JsonlEventLog::open(&path).await.unwrap(),
            sink.clone(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(listener.run(shutdown_rx));

        f.store_and_confirm("p1", ALICE);
        f.call(ALICE, "grantAccess", &["p1", BOB]).unwrap();
        f.call(BOB, "accessRecord", &["p1"]).unwrap();
        f.call(ALICE, "revokeAccess", &["p1", BOB]).unwrap();

        timeout(Duration::from_secs(5), async {
            while sink.alerts().len() < 6 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("timeout waiting for alerts");

        shutdown_tx.send(true).unwrap();
        let stats = timeout(Duration::from_secs(5), task)
            .await
            .expect("listener stops")
            .unwrap();
        assert_eq!(stats.received, 6);
        assert_eq!(stats.failures, 0);

        let alerts = sink.alerts();
        assert_eq!(alerts[0].title, "NEW ECG DATA ALERT");
        assert_eq!(alerts[0].field("Hospital"), Some("A"));
        assert_eq!(alerts[0].field("Owner"), Some("alice"));
        assert_eq!(alerts[3].field("Access granted to"), Some("bob"));
        assert_eq!(alerts[4].field("Accessed by"), Some("bob"));
        assert_eq!(alerts[4].field("Access type"), Some("AUTHORIZED_ACCESS"));
        assert_eq!(alerts[5].field("Access revoked from"), Some("bob"));

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let types: Vec<String> = text
            .lines()
            .map(|line| {
                let entry: Value = serde_json::from_str(line).unwrap();
                entry["eventType"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            types,
            vec![
                "RECORD_STORED",
                "VERIFICATION_REQUESTED",
                "VERIFICATION_COMPLETED",
                "ACCESS_GRANTED",
                "DATA_ACCESSED",
                "ACCESS_REVOKED",
            ]
        );
    }

    /// Events of other contracts never match the listener's filter.
    #[test]
    fn test_listener_filter_ignores_other_contracts() {
        let bus = Arc::new(InMemoryEventBus::new());
        let other = RecordService::new(
            InMemoryRecordStore::new(),
            BusEventSink::new(bus.clone(), "othercontract"),
            LedgerPolicy::default(),
        );
        let mut listener_sub = bus.subscribe(ListenerConfig::default().filter());
        let mut other_sub = bus.subscribe(EventFilter::contract("othercontract"));

        let ctx = TxContext::now(Identity::new(ADMIN));
        other
            .store_record(
                &ctx,
                StoreRequest {
                    patient_id: "p1".into(),
                    content_hash: "QmHash".into(),
                    original_timestamp: String::new(),
                    metadata: Metadata::default(),
                    owner: Identity::new(ALICE),
                },
            )
            .unwrap();

        assert!(listener_sub.try_recv().unwrap().is_none());
        assert_eq!(drain(&mut other_sub).len(), 2);
    }
}
