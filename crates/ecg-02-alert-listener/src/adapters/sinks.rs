//! # Alert Sinks
//!
//! `ConsoleAlertSink` prints alerts to stdout; `CollectingAlertSink` keeps
//! them in memory.

use crate::domain::Alert;
use crate::errors::ListenerError;
use crate::ports::outbound::AlertSink;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// Prints each alert as a framed block on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleAlertSink;

#[async_trait]
impl AlertSink for ConsoleAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), ListenerError> {
        println!("\n{alert}\n");
        info!(title = alert.title, patient_id = %alert.patient_id, "Alert raised");
        Ok(())
    }
}

/// Keeps delivered alerts for inspection.
#[derive(Debug, Default)]
pub struct CollectingAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl CollectingAlertSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered alerts.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn titles(&self) -> Vec<&'static str> {
        self.alerts().iter().map(|a| a.title).collect()
    }
}

#[async_trait]
impl AlertSink for CollectingAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), ListenerError> {
        self.alerts
            .lock()
            .map_err(|_| ListenerError::AlertDelivery("collector lock poisoned".to_string()))?
            .push(alert.clone());
        Ok(())
    }
}
