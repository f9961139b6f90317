//! # Error Types
//!
//! All error types for record ledger operations.

use shared_types::entities::RecordStatus;
use thiserror::Error;

// =============================================================================
// RECORD ERRORS
// =============================================================================

/// Errors returned by ledger operations.
///
/// Every error is a synchronous failure of the invoked operation. Nothing is
/// written and nothing is emitted when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// No record exists under the key.
    #[error("patient data for {patient_id} not found")]
    NotFound { patient_id: String },

    /// An identity to revoke is not in the authorized set.
    #[error("{identity} is not an authorized user of patient data {patient_id}")]
    GranteeNotFound {
        patient_id: String,
        identity: String,
    },

    /// Caller failed an ownership or membership check.
    #[error("caller ({caller}) is not authorized to {action} patient data {patient_id}")]
    Unauthorized {
        caller: String,
        action: &'static str,
        patient_id: String,
    },

    /// Operation attempted outside its required status.
    #[error("cannot {action} patient data {patient_id} while status is {status}")]
    InvalidState {
        patient_id: String,
        action: &'static str,
        status: RecordStatus,
    },

    /// Duplicate grant, or a create on an existing key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A transition would break a record invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The key-value substrate failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored blob does not decode as a record.
    #[error("codec error: {0}")]
    Codec(String),
}

impl RecordError {
    /// Stable machine-readable category.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::GranteeNotFound { .. } => "NOT_FOUND",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::Store(_) => "STORE_ERROR",
            Self::Codec(_) => "CODEC_ERROR",
        }
    }

    /// True for both flavours of "not found".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code() == "NOT_FOUND"
    }

    /// True if the caller can fix the request and retry.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            Self::Store(_) | Self::Codec(_) | Self::InvariantViolation(_)
        )
    }
}

// =============================================================================
// STORE ERRORS
// =============================================================================

/// Errors from the key-value substrate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached or its lock is poisoned.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The write was rejected by the substrate.
    #[error("write rejected for key {key}: {reason}")]
    WriteRejected { key: String, reason: String },

    /// Other store error.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// TESTS
// =============================================================================
