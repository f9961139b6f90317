//! # ECG Record Ledger Node
//!
//! Runs the record ledger with its event consumers until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics
//! 2. Load configuration from the environment
//! 3. Start the alert listener and the verification worker
//! 4. Run the demo flow if `ECG_DEMO` is set
//!
//! On Ctrl+C the tasks stop, the event log is flushed and the metrics
//! exposition is logged.

use anyhow::{Context, Result};
use ecg_node::demo::run_demo;
use ecg_node::{load_config, NodeRuntime};
use ecg_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = load_config();
    let demo = config.demo;

    let mut runtime = NodeRuntime::new(config);
    runtime.start().await?;

    if demo {
        match run_demo(&runtime).await {
            Ok(report) => info!(
                patient_id = %report.patient_id,
                status = %report.status,
                "Demo flow completed"
            ),
            Err(e) => error!(error = ?e, "Demo flow failed"),
        }
    }

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let report = runtime.shutdown().await;
    info!(
        committed = report.ledger.operations_committed,
        rejected = report.ledger.operations_rejected,
        events = report.ledger.events_emitted,
        "Ledger stats"
    );

    match encode_metrics() {
        Ok(text) => info!("Metrics at shutdown:\n{}", text),
        Err(e) => error!(error = %e, "Failed to encode metrics"),
    }

    Ok(())
}
