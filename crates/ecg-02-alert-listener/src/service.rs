//! # Alert Listener Service
//!
//! One dispatcher task per listener. For every event received from the bus:
//!
//! 1. Append `{receivedAt, eventType, rawPayload}` to the event log
//! 2. Render an alert and hand it to the alert sink
//!
//! Per-event failures are logged and counted; the loop keeps going. On
//! shutdown the in-flight event finishes, then the log is flushed and closed.

use crate::domain::{Alert, LogEntry};
use crate::errors::ListenerError;
use crate::ports::outbound::{AlertSink, EventLog};
use chrono::Utc;
use ecg_telemetry::{metric_inc, ALERT_FAILURES, EVENTS_RECEIVED, EVENT_LOG_LINES};
use serde_json::Value;
use shared_bus::{ContractEvent, Subscription};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Counters reported when the listener stops.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListenerStats {
    /// Events taken off the bus.
    pub received: u64,
    /// Alerts handed to the sink.
    pub alerts_delivered: u64,
    /// Lines appended to the event log.
    pub log_lines: u64,
    /// Per-event failures of any kind.
    pub failures: u64,
    /// Events missed because the listener lagged.
    pub skipped: u64,
}

/// Event consumer turning ledger events into alerts and log lines.
pub struct AlertListener<L: EventLog, A: AlertSink> {
    subscription: Subscription,
    log: L,
    sink: A,
    stats: ListenerStats,
}

enum Next {
    Event(Option<ContractEvent>),
    Shutdown { sender_gone: bool },
}

impl<L: EventLog, A: AlertSink> AlertListener<L, A> {
    pub fn new(subscription: Subscription, log: L, sink: A) -> Self {
        Self {
            subscription,
            log,
            sink,
            stats: ListenerStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &ListenerStats {
        &self.stats
    }

    /// Handle one event. Both steps always run; the first error is returned.
    pub async fn handle(&mut self, event: &ContractEvent) -> Result<(), ListenerError> {
        self.stats.received += 1;
        let parsed = serde_json::from_slice::<Value>(&event.payload);

        let entry = LogEntry::new(event, parsed.as_ref().ok(), Utc::now());
        metric_inc!(EVENTS_RECEIVED, &[entry.event_type.as_str()]);
        debug!(event_type = %entry.event_type, tx_id = %event.tx_id, "Event received");

        let logged = self.log.append(&entry).await;
        if logged.is_ok() {
            self.stats.log_lines += 1;
            metric_inc!(EVENT_LOG_LINES);
        }

        let alerted = match parsed {
            Ok(value) => match Alert::from_payload(&event.event_name, &value) {
                Some(alert) => self.sink.deliver(&alert).await,
                None => Err(ListenerError::MalformedPayload {
                    channel: event.event_name.clone(),
                    reason: "payload is not a JSON object".to_string(),
                }),
            },
            Err(e) => Err(ListenerError::MalformedPayload {
                channel: event.event_name.clone(),
                reason: e.to_string(),
            }),
        };
        if alerted.is_ok() {
            self.stats.alerts_delivered += 1;
        }

        for err in [logged.as_ref().err(), alerted.as_ref().err()].into_iter().flatten() {
            self.stats.failures += 1;
            metric_inc!(ALERT_FAILURES, &[err.reason()]);
            warn!(
                channel = %event.event_name,
                tx_id = %event.tx_id,
                error = %err,
                "Failed to handle event"
            );
        }

        logged.and(alerted)
    }

    /// Dispatch events until shutdown is signalled or the bus closes.
    #[instrument(skip_all, name = "alert_listener")]
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> ListenerStats {
        info!("Alert listener started, monitoring ledger for ECG events");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = tokio::select! {
                biased;
                changed = shutdown.changed() => Next::Shutdown { sender_gone: changed.is_err() },
                event = self.subscription.recv() => Next::Event(event),
            };

            match next {
                Next::Shutdown { sender_gone: true } => break,
                Next::Shutdown { sender_gone: false } => {}
                Next::Event(None) => {
                    info!("Event bus closed");
                    break;
                }
                Next::Event(Some(event)) => {
                    // Failures are already logged and counted.
                    let _ = self.handle(&event).await;
                }
            }
        }

        info!("Shutting down alert listener...");
        self.stats.skipped = self.subscription.skipped();
        if let Err(e) = self.log.flush().await {
            error!(error = %e, "Failed to flush event log");
        }
        if let Err(e) = self.log.close().await {
            error!(error = %e, "Failed to close event log");
        }
        info!(
            received = self.stats.received,
            alerts = self.stats.alerts_delivered,
            log_lines = self.stats.log_lines,
            failures = self.stats.failures,
            skipped = self.stats.skipped,
            "Alert listener stopped"
        );
        self.stats
    }
}

// =============================================================================
// TESTS
// =============================================================================
