//! # Node Adapters
//!
//! Concrete implementations of the node's ports.

pub mod content_store;

pub use content_store::*;
