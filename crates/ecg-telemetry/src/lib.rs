//! # ECG Telemetry
//!
//! Logging and metrics shared by the ledger's runtime components.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecg_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ECG_SERVICE_NAME` | `ecg-ledger` | Service name in the startup log |
//! | `ECG_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `ECG_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `ECG_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

pub mod config;
pub mod metrics;
mod tracing_setup;

pub use config::{parse_flag, TelemetryConfig};
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, ALERT_FAILURES, EVENTS_RECEIVED,
    EVENT_LOG_LINES, VERIFICATION_DURATION, VERIFICATION_OUTCOMES,
};
pub use tracing_setup::{build_filter, init_tracing};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_tracing(&config)?;
    Ok(TelemetryGuard { config })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    config: TelemetryConfig,
}

impl TelemetryGuard {
    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.config.service_name, "Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
