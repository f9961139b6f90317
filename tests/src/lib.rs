//! # ECG Record Ledger Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── ledger_benchmarks.rs   # Ledger operations and alert rendering
//! └── src/
//!     └── integration/           # Cross-crate flows
//!         ├── ledger_flows.rs    # ledger → bus → alert listener
//!         └── node_flows.rs      # full node: verification worker, demo, policy
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ecg-tests
//!
//! # Benchmarks
//! cargo bench -p ecg-tests
//! ```

pub mod integration;
