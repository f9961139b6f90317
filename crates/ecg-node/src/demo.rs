//! # Demo Flow
//!
//! End-to-end walk through a running node:
//!
//! 1. Admin uploads a dummy ECG to the content store and stores the record
//! 2. Wait for the verification worker to confirm it
//! 3. The patient grants a doctor access
//! 4. The doctor reads the record and fetches the content
//! 5. The patient reads the audit trail

use crate::ports::ContentStore;
use crate::runtime::NodeRuntime;
use anyhow::{bail, ensure, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use shared_types::identity::Identity;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

pub const DEMO_ADMIN: &str = "x509::CN=admin,OU=client::CN=ca.org1.example.com";
pub const DEMO_PATIENT: &str = "x509::CN=patient001,OU=client::CN=ca.org1.example.com";
pub const DEMO_DOCTOR: &str = "x509::CN=DR-TEST-001,OU=client::CN=ca.org1.example.com";

/// How long to wait for the record to leave `PENDING_VERIFICATION`.
pub const CONFIRMATION_WAIT: Duration = Duration::from_secs(15);

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SAMPLES_PER_LEAD: usize = 100;

/// What the demo observed.
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub patient_id: String,
    pub content_hash: String,
    pub status: String,
    pub audit_trail: Value,
}

/// Dummy two-lead recording in the upload format.
#[must_use]
pub fn dummy_ecg(patient_id: &str) -> Value {
    let lead = |scale: f64| -> Vec<f64> {
        (0..SAMPLES_PER_LEAD)
            .map(|i| ((i as f64 / 8.0).sin() * scale * 1000.0).round() / 1000.0)
            .collect()
    };
    json!({
        "patientInfo": { "id": patient_id, "age": 54, "gender": "F", "symptoms": "palpitations" },
        "recordInfo": {
            "deviceId": "ECG-512",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "samplingRate": 500
        },
        "leads": { "I": lead(0.9), "II": lead(1.1) },
        "analysis": { "heartRate": 72, "rhythm": "normal" }
    })
}

/// Run the demo against a started node.
pub async fn run_demo(runtime: &NodeRuntime) -> Result<DemoReport> {
    let admin = Identity::new(DEMO_ADMIN);
    let patient = Identity::new(DEMO_PATIENT);
    let doctor = Identity::new(DEMO_DOCTOR);
    let patient_id = format!(
        "GROUP5-PATIENT{}",
        &uuid::Uuid::new_v4().simple().to_string()[..5].to_uppercase()
    );
    info!(patient_id = %patient_id, "Starting demo flow");

    // Step 1: upload and store
    let ecg = dummy_ecg(&patient_id);
    let content = serde_json::to_vec(&ecg).context("Failed to encode dummy ECG")?;
    let content_hash = runtime
        .content()
        .put(content.clone())
        .await
        .context("Failed to upload ECG content")?;
    let metadata =
        json!({ "hospital": "Rumah Sakit UMM", "doctor": "Dr. Citra", "department": "Jantung" })
            .to_string();
    let timestamp = ecg["recordInfo"]["timestamp"].as_str().unwrap_or_default().to_string();
    let stored = runtime
        .invoke(
            &admin,
            "storeRecord",
            &[
                patient_id.as_str(),
                content_hash.as_str(),
                timestamp.as_str(),
                metadata.as_str(),
                patient.as_str(),
            ],
        )
        .context("storeRecord failed")?;
    info!(response = %stored, "[STEP 1/4] ECG stored, awaiting verification");

    // Step 2: wait for the verification worker
    let status = wait_for_verification(runtime, &patient, &patient_id, CONFIRMATION_WAIT).await?;
    ensure!(status == "CONFIRMED", "record verification ended in {status}");
    info!("[STEP 2/4] Record confirmed");

    // Step 3: patient grants the doctor
    let granted = runtime
        .invoke(&patient, "grantAccess", &[patient_id.as_str(), doctor.as_str()])
        .context("grantAccess failed")?;
    info!(response = %granted, "[STEP 3/4] Access granted");

    // Step 4: doctor reads the record, then the content
    let access: Value = serde_json::from_str(
        &runtime
            .invoke(&doctor, "accessRecord", &[patient_id.as_str()])
            .context("accessRecord failed")?,
    )?;
    let disclosed = access["contentHash"]
        .as_str()
        .context("accessRecord response has no contentHash")?;
    let fetched = runtime
        .content()
        .get(disclosed)
        .await
        .context("Failed to fetch ECG content")?;
    ensure!(fetched == content, "fetched content differs from the upload");
    info!(
        content_hash = %disclosed,
        bytes = fetched.len(),
        "[STEP 4/4] Doctor retrieved ECG content"
    );

    // Audit trail, owner only
    let audit_trail: Value = serde_json::from_str(
        &runtime
            .invoke(&patient, "getAuditTrail", &[patient_id.as_str()])
            .context("getAuditTrail failed")?,
    )?;
    println!("{}", serde_json::to_string_pretty(&audit_trail)?);

    Ok(DemoReport {
        patient_id,
        content_hash,
        status,
        audit_trail,
    })
}

/// Poll `getStatus` until the record leaves `PENDING_VERIFICATION`.
async fn wait_for_verification(
    runtime: &NodeRuntime,
    caller: &Identity,
    patient_id: &str,
    limit: Duration,
) -> Result<String> {
    let deadline = Instant::now() + limit;
    loop {
        let view: Value = serde_json::from_str(
            &runtime
                .invoke(caller, "getStatus", &[patient_id])
                .context("getStatus failed")?,
        )?;
        match view["status"].as_str() {
            Some("PENDING_VERIFICATION") => {}
            Some(status) => return Ok(status.to_string()),
            None => bail!("getStatus response has no status"),
        }
        if Instant::now() >= deadline {
            bail!("record {patient_id} still pending after {}s", limit.as_secs());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
