//! # ECG-01 Record Ledger
//!
//! Per-patient ECG records on a permissioned ledger. Each record holds a
//! pointer (content hash) to waveform data stored off-ledger, and this crate
//! decides who may read that pointer.
//!
//! ## Lifecycle
//!
//! ```text
//! storeRecord ──► PENDING_VERIFICATION ──confirmRecord(true)──► CONFIRMED
//!                         │                                        │
//!                         │                          grant / revoke / access
//!                         └────────confirmRecord(false)───────► FAILED (terminal)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Status is monotonic, terminal after verification | `invariants::check_status_monotonic()` |
//! | `authorizedUsers` never holds the owner or duplicates | `invariants::check_authorized_set()` |
//! | `accessHistory` is append-only | `audit::is_append_only()` |
//! | Creation fields are immutable | `invariants::check_immutable_fields()` |
//! | Content is read only when `CONFIRMED` | `transitions::access_record()` |
//! | Grant and revoke by the owner when `CONFIRMED` | `transitions::{grant,revoke}_access()` |
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Ledger world state | `RecordStore` | get/put encoded records |
//! | Host runtime | `TransactionContext` | caller identity, tx time, tx id |
//! | Event transport | `EventSink` | post-commit event emission |
//!
//! ## Usage Example
//!
//! ```ignore
//! use ecg_01_record_ledger::prelude::*;
//!
//! let service = RecordService::new(InMemoryRecordStore::new(), sink, LedgerPolicy::default());
//! let ctx = TxContext::now(Identity::new("x509::CN=admin"));
//! service.store_record(&ctx, request)?;
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::audit::{AccessRecord, AuditTrail};
    pub use crate::domain::entities::{
        AccessResponse, AccessorInfo, EcgRecord, LedgerPolicy, StatusView, StoreReceipt,
        StoreRequest, VerificationDetails,
    };
    pub use crate::domain::invariants::{
        check_all_invariants, InvariantCheckResult, InvariantViolation,
    };
    pub use crate::domain::value_objects::{Metadata, ValidityFlag};

    // Ports
    pub use crate::ports::inbound::RecordLedgerApi;
    pub use crate::ports::outbound::{EventSink, RecordStore, TransactionContext};

    // Errors
    pub use crate::errors::{RecordError, StoreError};

    // Adapters
    pub use crate::adapters::{
        BusEventSink, ChaincodeDispatcher, InMemoryRecordStore, RecordingEventSink, TxContext,
        DEFAULT_CONTRACT_NAME,
    };

    // Service
    pub use crate::service::{RecordService, ServiceStats};

    // Shared types
    pub use shared_types::entities::{AccessType, LedgerTime, RecordStatus};
    pub use shared_types::identity::Identity;
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Record Ledger";

// =============================================================================
// TESTS
// =============================================================================
