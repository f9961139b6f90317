//! # Transaction Context Adapter
//!
//! Concrete `TransactionContext` for in-process invocations.

use crate::ports::outbound::TransactionContext;
use chrono::Utc;
use shared_types::entities::LedgerTime;
use shared_types::identity::Identity;
use uuid::Uuid;

/// Caller identity, transaction time and id for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    identity: Identity,
    timestamp: LedgerTime,
    tx_id: String,
}

impl TxContext {
    /// Context with an explicit transaction time and id.
    pub fn new(identity: Identity, timestamp: LedgerTime, tx_id: impl Into<String>) -> Self {
        Self {
            identity,
            timestamp,
            tx_id: tx_id.into(),
        }
    }

    /// Context stamped by the host at submission: current time, fresh id.
    pub fn now(identity: Identity) -> Self {
        Self::new(identity, Utc::now(), Uuid::new_v4().to_string())
    }
}

impl TransactionContext for TxContext {
    fn client_identity(&self) -> &Identity {
        &self.identity
    }

    fn tx_timestamp(&self) -> LedgerTime {
        self.timestamp
    }

    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}
