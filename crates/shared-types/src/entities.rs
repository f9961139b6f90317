//! # Core Domain Entities
//!
//! Status and access vocabulary that appears both in stored records and in
//! emitted event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic transaction time supplied by the ledger.
///
/// Every state-affecting timestamp uses this, never the local clock.
pub type LedgerTime = DateTime<Utc>;

// =============================================================================
// RECORD STATUS
// =============================================================================

/// Escrow status of a record.
///
/// `PendingVerification` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    /// Stored, waiting for the external verifier.
    PendingVerification,
    /// Verified; content may be read by the owner and authorized users.
    Confirmed,
    /// Verification failed; content is never readable.
    Failed,
}

impl RecordStatus {
    /// Wire name, e.g. `PENDING_VERIFICATION`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingVerification => "PENDING_VERIFICATION",
            Self::Confirmed => "CONFIRMED",
            Self::Failed => "FAILED",
        }
    }

    /// Returns true once verification has completed either way.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingVerification)
    }

    /// Whether `self -> next` is an allowed status transition.
    #[must_use]
    pub fn can_transition_to(&self, next: RecordStatus) -> bool {
        matches!(
            (self, next),
            (Self::PendingVerification, Self::Confirmed)
                | (Self::PendingVerification, Self::Failed)
        )
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ACCESS TYPE
// =============================================================================

/// How a reader was entitled to a successful content read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    /// The record owner read their own data.
    OwnerAccess,
    /// A member of `authorizedUsers` read the data.
    AuthorizedAccess,
}

impl AccessType {
    /// Wire name, e.g. `OWNER_ACCESS`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnerAccess => "OWNER_ACCESS",
            Self::AuthorizedAccess => "AUTHORIZED_ACCESS",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================
