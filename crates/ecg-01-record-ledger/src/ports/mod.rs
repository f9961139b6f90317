//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `RecordLedgerApi`
//! - **Driven Ports (Outbound)**: `RecordStore`, `TransactionContext`, `EventSink`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
