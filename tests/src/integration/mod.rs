//! # Integration Flows
//!
//! Tests spanning the ledger, the event bus, the alert listener and the node.

mod ledger_flows;
mod node_flows;
