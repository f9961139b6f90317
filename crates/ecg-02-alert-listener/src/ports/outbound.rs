//! # Driven Ports (SPI - Outbound)
//!
//! Where alerts and log lines go.

use crate::domain::{Alert, LogEntry};
use crate::errors::ListenerError;
use async_trait::async_trait;
use std::sync::Arc;

/// Destination for rendered alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert.
    async fn deliver(&self, alert: &Alert) -> Result<(), ListenerError>;
}

#[async_trait]
impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    async fn deliver(&self, alert: &Alert) -> Result<(), ListenerError> {
        (**self).deliver(alert).await
    }
}

/// Append-only local event log.
#[async_trait]
pub trait EventLog: Send {
    /// Append one entry as a single line.
    async fn append(&mut self, entry: &LogEntry) -> Result<(), ListenerError>;

    /// Push buffered lines to the underlying storage.
    async fn flush(&mut self) -> Result<(), ListenerError>;

    /// Flush and release the log. Later appends fail.
    async fn close(&mut self) -> Result<(), ListenerError>;
}
