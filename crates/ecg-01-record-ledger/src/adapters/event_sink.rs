//! # Event Sink Adapters
//!
//! `BusEventSink` publishes ledger events onto the shared bus as named
//! contract events. `RecordingEventSink` keeps them in memory for tests.

use crate::ports::outbound::EventSink;
use shared_bus::{ContractEvent, EventPublisher};
use shared_types::errors::PayloadError;
use shared_types::events::RecordEvent;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Default contract name stamped on emitted events.
pub const DEFAULT_CONTRACT_NAME: &str = "ecgcontract";

// =============================================================================
// BUS SINK
// =============================================================================

/// Publishes each event on its own channel of the bus.
pub struct BusEventSink<P: EventPublisher> {
    publisher: Arc<P>,
    contract: String,
}

impl<P: EventPublisher> BusEventSink<P> {
    pub fn new(publisher: Arc<P>, contract: impl Into<String>) -> Self {
        Self {
            publisher,
            contract: contract.into(),
        }
    }

    /// Contract name stamped on every event.
    #[must_use]
    pub fn contract(&self) -> &str {
        &self.contract
    }
}

impl<P: EventPublisher> EventSink for BusEventSink<P> {
    fn emit(&self, tx_id: &str, events: &[RecordEvent]) -> Result<(), PayloadError> {
        // Encode everything first so a bad payload publishes nothing.
        let envelopes = events
            .iter()
            .map(|event| ContractEvent::from_record_event(self.contract.as_str(), tx_id, event))
            .collect::<Result<Vec<_>, _>>()?;

        for envelope in envelopes {
            let event_name = envelope.event_name.clone();
            let receivers = self.publisher.publish(envelope);
            debug!(tx_id, event = %event_name, receivers, "Published ledger event");
        }
        Ok(())
    }
}

// =============================================================================
// RECORDING SINK
// =============================================================================

/// Captures emitted events with their transaction id.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    emitted: Mutex<Vec<(String, RecordEvent)>>,
}

impl RecordingEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<(String, RecordEvent)> {
        self.emitted.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Channel names in emission order.
    pub fn channels(&self) -> Vec<&'static str> {
        self.events().iter().map(|(_, e)| e.channel()).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut emitted) = self.emitted.lock() {
            emitted.clear();
        }
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, tx_id: &str, events: &[RecordEvent]) -> Result<(), PayloadError> {
        let mut emitted = self
            .emitted
            .lock()
            .map_err(|_| PayloadError::Malformed("recording sink lock poisoned".to_string()))?;
        emitted.extend(events.iter().map(|e| (tx_id.to_string(), e.clone())));
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
