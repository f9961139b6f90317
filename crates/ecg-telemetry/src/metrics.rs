//! Prometheus metrics for the record ledger's downstream consumers.
//!
//! All metrics follow the naming convention: `ecg_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ALERT LISTENER
    // =========================================================================

    /// Events received by the listener
    pub static ref EVENTS_RECEIVED: CounterVec = CounterVec::new(
        Opts::new(
            "ecg_listener_events_received_total",
            "Contract events received by the alert listener"
        ),
        &["event_type"]
    ).expect("metric creation failed");

    /// Per-event handling failures
    pub static ref ALERT_FAILURES: CounterVec = CounterVec::new(
        Opts::new("ecg_listener_failures_total", "Events the listener failed to handle"),
        &["reason"]  // reason: malformed_payload/log_write/alert_sink
    ).expect("metric creation failed");

    /// Lines appended to the event log
    pub static ref EVENT_LOG_LINES: Counter = Counter::new(
        "ecg_listener_log_lines_written_total",
        "Lines appended to the local event log"
    ).expect("metric creation failed");

    // =========================================================================
    // VERIFICATION WORKER
    // =========================================================================

    /// Verification outcomes
    pub static ref VERIFICATION_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("ecg_verifier_outcomes_total", "Verification attempts by outcome"),
        &["result"]  // result: confirmed/failed/timeout/error
    ).expect("metric creation failed");

    /// Time from request to confirmRecord
    pub static ref VERIFICATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "ecg_verifier_duration_seconds",
            "Time spent verifying a content hash"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).unwrap_or_default())
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Listener
        Box::new(EVENTS_RECEIVED.clone()),
        Box::new(ALERT_FAILURES.clone()),
        Box::new(EVENT_LOG_LINES.clone()),
        // Verifier
        Box::new(VERIFICATION_OUTCOMES.clone()),
        Box::new(VERIFICATION_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
