//! # Event Log Entries
//!
//! One JSON line per received event: `{receivedAt, eventType, rawPayload}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_bus::ContractEvent;
use shared_types::events::channels;

/// A line of the append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Wall-clock time the listener received the event.
    pub received_at: DateTime<Utc>,
    pub event_type: String,
    /// Payload exactly as delivered, lossily decoded as UTF-8.
    pub raw_payload: String,
}

impl LogEntry {
    /// Entry for `event`, received at `received_at`.
    ///
    /// The event type comes from the channel; for unknown channels it falls
    /// back to the payload's `eventType`, then to the channel name.
    #[must_use]
    pub fn new(event: &ContractEvent, parsed: Option<&Value>, received_at: DateTime<Utc>) -> Self {
        let event_type = channels::event_type_for(&event.event_name)
            .map(str::to_string)
            .or_else(|| {
                parsed
                    .and_then(|v| v.get("eventType"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| event.event_name.clone());

        Self {
            received_at,
            event_type,
            raw_payload: event.payload_text().into_owned(),
        }
    }

    /// Encode as a single line, without the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
