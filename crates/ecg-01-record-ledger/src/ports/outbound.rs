//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the record ledger depends on:
//! - Record store (ledger key-value substrate)
//! - Transaction context (caller identity and ledger time)
//! - Event sink (event transport)
//!
//! The ledger core is a synchronous unit of work per invocation, so these
//! traits are synchronous too.

use crate::errors::StoreError;
use shared_types::entities::LedgerTime;
use shared_types::errors::PayloadError;
use shared_types::events::RecordEvent;
use shared_types::identity::Identity;
use std::sync::Arc;

// =============================================================================
// RECORD STORE
// =============================================================================

/// Key-value substrate holding one encoded record per patient key.
///
/// Ordering and per-key serializability are the substrate's job.
pub trait RecordStore: Send + Sync {
    /// Read the blob under `key`. `None` if never written.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write the blob under `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put_state(key, value)
    }
}

// =============================================================================
// TRANSACTION CONTEXT
// =============================================================================

/// Per-invocation facts supplied by the host runtime.
pub trait TransactionContext: Send + Sync {
    /// Opaque identity of the submitting client.
    fn client_identity(&self) -> &Identity;

    /// Deterministic ledger transaction time. Never wall-clock.
    fn tx_timestamp(&self) -> LedgerTime;

    /// Transaction id, carried on emitted events.
    fn tx_id(&self) -> &str;
}

// =============================================================================
// EVENT SINK
// =============================================================================

/// Event transport. Called only after the record write succeeded.
pub trait EventSink: Send + Sync {
    /// Emit `events` in order under one transaction id.
    fn emit(&self, tx_id: &str, events: &[RecordEvent]) -> Result<(), PayloadError>;
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, tx_id: &str, events: &[RecordEvent]) -> Result<(), PayloadError> {
        (**self).emit(tx_id, events)
    }
}
