//! # Event Handlers
//!
//! Bus consumers spawned by the node runtime.

pub mod verification;

pub use verification::*;
