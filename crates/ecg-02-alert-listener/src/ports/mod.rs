//! # Ports Layer
//!
//! - **Driven Ports (Outbound)**: `AlertSink`, `EventLog`

pub mod outbound;

pub use outbound::*;
