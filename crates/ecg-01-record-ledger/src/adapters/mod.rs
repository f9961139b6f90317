//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the ledger ports, plus the chaincode
//! dispatcher that drives `RecordLedgerApi` from string invocations.

pub mod context;
pub mod dispatcher;
pub mod event_sink;
pub mod store;

pub use context::*;
pub use dispatcher::*;
pub use event_sink::*;
pub use store::*;
