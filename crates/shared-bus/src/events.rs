//! # Contract Events
//!
//! The transport-level envelope: a named event emitted by a contract inside
//! a transaction, carrying an opaque payload.

use shared_types::errors::PayloadError;
use shared_types::events::RecordEvent;
use std::borrow::Cow;

/// A named event as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEvent {
    /// Contract that emitted the event (e.g. `ecgcontract`).
    pub contract: String,
    /// Event name, which doubles as the channel (e.g. `RecordStored`).
    pub event_name: String,
    /// Raw payload bytes; JSON for the record ledger.
    pub payload: Vec<u8>,
    /// Transaction that produced the event.
    pub tx_id: String,
}

impl ContractEvent {
    /// Create a new event envelope.
    pub fn new(
        contract: impl Into<String>,
        event_name: impl Into<String>,
        payload: Vec<u8>,
        tx_id: impl Into<String>,
    ) -> Self {
        Self {
            contract: contract.into(),
            event_name: event_name.into(),
            payload,
            tx_id: tx_id.into(),
        }
    }

    /// Wrap a ledger event, serializing it to its JSON payload.
    pub fn from_record_event(
        contract: impl Into<String>,
        tx_id: impl Into<String>,
        event: &RecordEvent,
    ) -> Result<Self, PayloadError> {
        Ok(Self::new(
            contract,
            event.channel(),
            event.to_payload()?,
            tx_id,
        ))
    }

    /// Payload as text; invalid UTF-8 is replaced.
    #[must_use]
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Decode the payload as a ledger event on this event's channel.
    pub fn decode(&self) -> Result<RecordEvent, PayloadError> {
        RecordEvent::decode(&self.event_name, &self.payload)
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Contracts to include. Empty means all contracts.
    pub contracts: Vec<String>,
    /// Event names to include. Empty means all names.
    pub event_names: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for every event of one contract.
    #[must_use]
    pub fn contract(contract: impl Into<String>) -> Self {
        Self {
            contracts: vec![contract.into()],
            event_names: Vec::new(),
        }
    }

    /// Restrict the filter to the given event names.
    #[must_use]
    pub fn with_events<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ContractEvent) -> bool {
        let contract_match =
            self.contracts.is_empty() || self.contracts.iter().any(|c| *c == event.contract);

        let name_match =
            self.event_names.is_empty() || self.event_names.iter().any(|n| *n == event.event_name);

        contract_match && name_match
    }
}
