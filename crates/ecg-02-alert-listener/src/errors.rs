//! # Error Types
//!
//! Errors raised while handling a single event. None of them stop the
//! listener loop.

use thiserror::Error;

/// Per-event and lifecycle errors of the alert listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Payload is not a JSON object.
    #[error("malformed payload on {channel}: {reason}")]
    MalformedPayload { channel: String, reason: String },

    /// The event log could not be opened or written.
    #[error("event log I/O error: {0}")]
    LogIo(#[from] std::io::Error),

    /// A log entry could not be encoded.
    #[error("event log encode error: {0}")]
    LogEncode(#[from] serde_json::Error),

    /// The event log was used after `close`.
    #[error("event log is closed")]
    LogClosed,

    /// An alert could not be delivered.
    #[error("alert delivery failed: {0}")]
    AlertDelivery(String),
}

impl ListenerError {
    /// Metric label for `ecg_listener_failures_total`.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::LogIo(_) | Self::LogEncode(_) | Self::LogClosed => "log_write",
            Self::AlertDelivery(_) => "alert_sink",
        }
    }
}
