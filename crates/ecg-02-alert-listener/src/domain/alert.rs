//! # Alerts
//!
//! Human-readable rendering of ledger events. Rendering reads the payload
//! loosely: any missing field shows as `Unknown` instead of failing.

use serde_json::{Map, Value};
use shared_types::events::channels;
use shared_types::identity::{display_name, UNKNOWN_IDENTITY};
use std::fmt;

/// Characters of the content hash shown in an alert.
pub const HASH_PREFIX_LEN: usize = 20;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// One rendered alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Headline, e.g. `NEW ECG DATA ALERT`.
    pub title: &'static str,
    /// Channel the event arrived on.
    pub channel: String,
    /// Patient key, or `Unknown`.
    pub patient_id: String,
    /// Labelled lines in display order.
    pub lines: Vec<(&'static str, String)>,
}

impl Alert {
    /// Render the alert for a payload received on `channel`.
    ///
    /// Returns `None` if the payload is not a JSON object.
    #[must_use]
    pub fn from_payload(channel: &str, payload: &Value) -> Option<Self> {
        let fields = payload.as_object()?;
        let f = Fields(fields);

        let (title, lines) = match channel {
            channels::RECORD_STORED => (
                "NEW ECG DATA ALERT",
                vec![
                    ("Hospital", f.text("hospital")),
                    ("Doctor", f.text("doctor")),
                    ("Timestamp", f.text("timestamp")),
                    ("Content Hash", f.hash("contentHash")),
                    ("Input By", f.identity("inputBy")),
                    ("Owner", f.identity("owner")),
                ],
            ),
            channels::VERIFICATION_REQUESTED => (
                "VERIFICATION REQUESTED",
                vec![
                    ("Content Hash", f.hash("contentHash")),
                    ("Requested by", f.identity("requestedBy")),
                    ("Timeout (s)", f.text("timeoutSeconds")),
                    ("Timestamp", f.text("timestamp")),
                ],
            ),
            channels::VERIFICATION_COMPLETED => (
                "VERIFICATION COMPLETED",
                vec![
                    ("Result", f.text("result")),
                    ("Verified by", f.identity("verifiedBy")),
                    ("Details", f.text("details")),
                    ("Timestamp", f.text("timestamp")),
                ],
            ),
            channels::ACCESS_GRANTED => (
                "ACCESS GRANTED ALERT",
                vec![
                    ("Access granted to", f.identity("grantedTo")),
                    ("Granted by", f.identity("grantedBy")),
                    ("Timestamp", f.text("timestamp")),
                ],
            ),
            channels::ACCESS_REVOKED => (
                "ACCESS REVOKED ALERT",
                vec![
                    ("Access revoked from", f.identity("revokedFrom")),
                    ("Revoked by", f.identity("revokedBy")),
                    ("Timestamp", f.text("timestamp")),
                ],
            ),
            channels::DATA_ACCESSED => (
                "DATA ACCESS ALERT",
                vec![
                    ("Accessed by", f.identity("accessedBy")),
                    ("Access type", f.text("accessType")),
                    ("Timestamp", f.text("timestamp")),
                ],
            ),
            _ => (
                "LEDGER EVENT",
                vec![
                    ("Event type", f.text("eventType")),
                    ("Timestamp", f.text("timestamp")),
                ],
            ),
        };

        Some(Self {
            title,
            channel: channel.to_string(),
            patient_id: f.text("patientID"),
            lines,
        })
    }

    /// Value of a labelled line.
    #[must_use]
    pub fn field(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Patient ID: {}", self.patient_id)?;
        for (label, value) in &self.lines {
            writeln!(f, "{label}: {value}")?;
        }
        write!(f, "{RULE}")
    }
}

/// First [`HASH_PREFIX_LEN`] characters followed by `...`.
#[must_use]
pub fn shorten_hash(hash: &str) -> String {
    let prefix: String = hash.chars().take(HASH_PREFIX_LEN).collect();
    format!("{prefix}...")
}

struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn raw(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn text(&self, key: &str) -> String {
        self.raw(key)
            .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
    }

    fn identity(&self, key: &str) -> String {
        display_name(self.raw(key).as_deref())
    }

    fn hash(&self, key: &str) -> String {
        self.raw(key)
            .map(|h| shorten_hash(&h))
            .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
    }
}
