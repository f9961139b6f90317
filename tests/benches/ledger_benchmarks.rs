//! # ECG Record Ledger Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Record ledger | store → confirm → grant → access through the dispatcher |
//! | Record ledger | `getStatus` on a record with a long audit trail |
//! | Alert listener | alert rendering per channel |

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ecg_01_record_ledger::prelude::*;
use ecg_02_alert_listener::domain::Alert;
use serde_json::json;
use shared_types::events::channels;
use std::time::Duration;

type Ledger = RecordService<InMemoryRecordStore, RecordingEventSink>;

const ADMIN: &str = "x509::CN=admin";
const OWNER: &str = "x509::CN=patient001";
const DOCTOR: &str = "x509::CN=doctor001";
const VERIFIER: &str = "x509::CN=verifier";

fn dispatcher() -> ChaincodeDispatcher<Ledger> {
    ChaincodeDispatcher::new(RecordService::new(
        InMemoryRecordStore::new(),
        RecordingEventSink::new(),
        LedgerPolicy::default(),
    ))
}

fn call(d: &ChaincodeDispatcher<Ledger>, who: &str, function: &str, args: &[&str]) -> String {
    let ctx = TxContext::now(Identity::new(who));
    d.invoke(&ctx, function, args).unwrap_or_default()
}

// ============================================================================
// RECORD LEDGER
// ============================================================================

fn bench_record_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecg-01-record-ledger");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("store_confirm_grant_access", |b| {
        let d = dispatcher();
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let patient_id = format!("p{n}");
            call(
                &d,
                ADMIN,
                "storeRecord",
                &[patient_id.as_str(), "QmHash", "", r#"{"hospital":"A","doctor":"B"}"#, OWNER],
            );
            call(&d, VERIFIER, "confirmRecord", &[patient_id.as_str(), "true", "ok"]);
            call(&d, OWNER, "grantAccess", &[patient_id.as_str(), DOCTOR]);
            black_box(call(&d, DOCTOR, "accessRecord", &[patient_id.as_str()]))
        })
    });

    for history in [10usize, 100, 1000] {
        let d = dispatcher();
        call(&d, ADMIN, "storeRecord", &["p1", "QmHash", "", "", OWNER]);
        call(&d, VERIFIER, "confirmRecord", &["p1", "true", "ok"]);
        for _ in 0..history {
            call(&d, OWNER, "accessRecord", &["p1"]);
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("status_with_history", history),
            &history,
            |b, _| b.iter(|| black_box(call(&d, OWNER, "getStatus", &["p1"]))),
        );
    }

    group.finish();
}

// ============================================================================
// ALERT LISTENER
// ============================================================================

fn bench_alert_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecg-02-alert-listener");

    let payload = json!({
        "eventType": "RECORD_STORED",
        "patientID": "PAT001",
        "contentHash": "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
        "hospital": "RS Harapan",
        "doctor": "Dr. Smith",
        "inputBy": "x509::/OU=client/CN=admin::/CN=ca.org1",
        "owner": "x509::CN=patient001,OU=client::CN=ca",
        "timestamp": Utc::now().to_rfc3339(),
    });

    for channel in channels::ALL {
        group.bench_with_input(BenchmarkId::new("render", channel), &payload, |b, p| {
            b.iter(|| black_box(Alert::from_payload(channel, p).map(|a| a.to_string())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record_lifecycle, bench_alert_rendering);
criterion_main!(benches);
