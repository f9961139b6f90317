//! # Node Flows
//!
//! End-to-end through a started `NodeRuntime`: chaincode invocations, the
//! verification worker, the alert listener and the event log together.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use serde_json::Value;
    use shared_types::identity::Identity;

    use ecg_01_record_ledger::errors::RecordError;
    use ecg_02_alert_listener::adapters::CollectingAlertSink;
    use ecg_node::demo::{run_demo, DEMO_DOCTOR};
    use ecg_node::ports::ContentStore;
    use ecg_node::{NodeConfig, NodeRuntime};

    const ADMIN: &str = "x509::CN=admin";
    const OWNER: &str = "x509::CN=patient001";
    const DOCTOR: &str = "x509::CN=doctor001";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    async fn started(
        dir: &tempfile::TempDir,
        tweak: impl FnOnce(&mut NodeConfig),
    ) -> (NodeRuntime, Arc<CollectingAlertSink>) {
        let mut config = NodeConfig::default();
        config.listener = config.listener.with_event_log(dir.path().join("events.log"));
        config.policy.verification_timeout_secs = 5;
        tweak(&mut config);

        let mut runtime = NodeRuntime::new(config);
        let alerts = Arc::new(CollectingAlertSink::new());
        runtime.start_with_sink(alerts.clone()).await.unwrap();
        (runtime, alerts)
    }

    fn json(runtime: &NodeRuntime, who: &str, function: &str, args: &[&str]) -> Value {
        serde_json::from_str(&runtime.invoke(&Identity::new(who), function, args).unwrap()).unwrap()
    }

    async fn wait_for_status(runtime: &NodeRuntime, patient_id: &str, wanted: &str) {
        timeout(Duration::from_secs(5), async {
            while json(runtime, OWNER, "getStatus", &[patient_id])["status"] != wanted {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{patient_id} never reached {wanted}"));
    }

    async fn wait_for_alerts(alerts: &CollectingAlertSink, count: usize) {
        timeout(Duration::from_secs(5), async {
            while alerts.alerts().len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("timeout waiting for alerts");
    }

    // =============================================================================
    // ESCROW VERIFICATION
    // =============================================================================

    /// Content that is not JSON fails verification; the record is then closed to everyone.
    #[tokio::test]
    async fn test_malformed_content_fails_and_locks_record() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runtime, alerts) = started(&dir, |_| {}).await;

        let hash = runtime.content().put(b"%PDF-1.4 not an ecg".to_vec()).await.unwrap();
        runtime
            .invoke(&Identity::new(ADMIN), "storeRecord", &["p1", hash.as_str(), "", "", OWNER])
            .unwrap();
        wait_for_status(&runtime, "p1", "FAILED").await;

        let status = json(&runtime, OWNER, "getStatus", &["p1"]);
        assert_eq!(status["readyForContentAccess"], false);
        assert_eq!(status["verificationDetails"]["isValid"], false);

        let owner = Identity::new(OWNER);
        assert!(matches!(
            runtime.invoke(&owner, "accessRecord", &["p1"]),
            Err(RecordError::InvalidState { .. })
        ));
        assert!(matches!(
            runtime.invoke(&owner, "grantAccess", &["p1", DOCTOR]),
            Err(RecordError::InvalidState { .. })
        ));

        wait_for_alerts(&alerts, 3).await;
        let report = runtime.shutdown().await;
        assert_eq!(report.verifier.unwrap().failed, 1);
        assert_eq!(alerts.alerts()[2].field("Result"), Some("FAILED"));
    }

    /// A hash the content store never saw fails verification.
    #[tokio::test]
    async fn test_unknown_hash_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runtime, _alerts) = started(&dir, |_| {}).await;

        runtime
            .invoke(&Identity::new(ADMIN), "storeRecord", &["p1", "QmMissing", "", "", OWNER])
            .unwrap();
        wait_for_status(&runtime, "p1", "FAILED").await;

        let status = json(&runtime, OWNER, "getStatus", &["p1"]);
        assert!(status["verificationDetails"]["details"]
            .as_str()
            .unwrap()
            .starts_with("content not retrievable"));
        runtime.shutdown().await;
    }

    /// Several records verified concurrently each end up confirmed.
    #[tokio::test]
    async fn test_many_records_all_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runtime, _alerts) = started(&dir, |_| {}).await;
        let admin = Identity::new(ADMIN);

        for i in 0..10 {
            let body = format!(r#"{{"sample":{i}}}"#);
            let hash = runtime.content().put(body.into_bytes()).await.unwrap();
            let patient_id = format!("p{i}");
            runtime
                .invoke(&admin, "storeRecord", &[patient_id.as_str(), hash.as_str(), "", "", OWNER])
                .unwrap();
        }
        for i in 0..10 {
            wait_for_status(&runtime, &format!("p{i}"), "CONFIRMED").await;
        }

        let report = runtime.shutdown().await;
        assert_eq!(report.verifier.unwrap().confirmed, 10);
        assert_eq!(report.ledger.operations_committed, 20);
    }

    // =============================================================================
    // STORE POLICY
    // =============================================================================

    /// By default a second store on the same key is a conflict.
    #[tokio::test]
    async fn test_duplicate_store_conflicts_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runtime, _alerts) = started(&dir, |_| {}).await;
        let admin = Identity::new(ADMIN);

        runtime
            .invoke(&admin, "storeRecord", &["p1", "QmA", "", "", OWNER])
            .unwrap();
        assert!(matches!(
            runtime.invoke(&admin, "storeRecord", &["p1", "QmB", "", "", OWNER]),
            Err(RecordError::Conflict(_))
        ));
        runtime.shutdown().await;
    }

    /// With overwrite enabled the record is replaced and verification restarts.
    #[tokio::test]
    async fn test_overwrite_policy_restarts_escrow() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runtime, _alerts) = started(&dir, |c| c.policy.allow_overwrite = true).await;
        let admin = Identity::new(ADMIN);

        let first = runtime.content().put(b"{\"v\":1}".to_vec()).await.unwrap();
        runtime
            .invoke(&admin, "storeRecord", &["p1", first.as_str(), "", "", OWNER])
            .unwrap();
        wait_for_status(&runtime, "p1", "CONFIRMED").await;

        let second = runtime.content().put(b"{\"v\":2}".to_vec()).await.unwrap();
        let receipt: Value = serde_json::from_str(
            &runtime
                .invoke(&admin, "storeRecord", &["p1", second.as_str(), "", "", OWNER])
                .unwrap(),
        )
        .unwrap();
        assert_eq!(receipt["overwritten"], true);
        wait_for_status(&runtime, "p1", "CONFIRMED").await;

        let access = json(&runtime, OWNER, "accessRecord", &["p1"]);
        assert_eq!(access["contentHash"], second.as_str());
        runtime.shutdown().await;
    }

    // =============================================================================
    // DEMO
    // =============================================================================

    /// The demo flow leaves a consistent ledger and a complete event log.
    #[tokio::test]
    async fn test_demo_flow_against_node() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runtime, alerts) = started(&dir, |_| {}).await;

        let report = run_demo(&runtime).await.unwrap();
        assert_eq!(report.status, "CONFIRMED");

        // The doctor keeps access after the demo.
        let access = json(&runtime, DEMO_DOCTOR, "accessRecord", &[report.patient_id.as_str()]);
        assert_eq!(access["contentHash"], report.content_hash.as_str());

        wait_for_alerts(&alerts, 6).await;
        runtime.shutdown().await;

        let log = tokio::fs::read_to_string(dir.path().join("events.log"))
            .await
            .unwrap();
        let types: Vec<String> = log
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
                "DATA_ACCESSED",
            ]
        );
    }
}
