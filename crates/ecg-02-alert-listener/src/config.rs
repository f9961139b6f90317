//! Listener configuration from environment variables.

use shared_bus::EventFilter;
use shared_types::events::channels;
use std::env;
use std::path::PathBuf;

/// Default location of the append-only event log.
pub const DEFAULT_EVENT_LOG: &str = "/tmp/ecg_events.log";

/// Default contract whose events are consumed.
pub const DEFAULT_CONTRACT: &str = "ecgcontract";

/// Configuration for the alert listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// JSONL file every received event is appended to
    pub event_log_path: PathBuf,

    /// Contract name to subscribe to
    pub contract_name: String,

    /// Event channels to subscribe to
    pub channels: Vec<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            event_log_path: PathBuf::from(DEFAULT_EVENT_LOG),
            contract_name: DEFAULT_CONTRACT.to_string(),
            channels: channels::ALL.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

impl ListenerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ECG_EVENT_LOG`: Event log path (default: /tmp/ecg_events.log)
    /// - `ECG_CONTRACT_NAME`: Contract to listen to (default: ecgcontract)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            event_log_path: lookup("ECG_EVENT_LOG")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.event_log_path),
            contract_name: lookup("ECG_CONTRACT_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.contract_name),
            channels: defaults.channels,
        }
    }

    /// Bus filter selecting this listener's contract and channels.
    #[must_use]
    pub fn filter(&self) -> EventFilter {
        EventFilter::contract(self.contract_name.as_str())
            .with_events(self.channels.iter().cloned())
    }

    /// Override the event log path.
    #[must_use]
    pub fn with_event_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.event_log_path = path.into();
        self
    }
}
