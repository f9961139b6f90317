//! # Domain Invariants
//!
//! Record invariants that MUST hold across every committed transition.
//! The service checks them on the `(before, after)` pair before writing.
//!
//! - Status is monotonic: `PENDING_VERIFICATION → {CONFIRMED, FAILED}`, terminal after
//! - `authorizedUsers` never contains `owner` and has no duplicates
//! - `accessHistory` is append-only
//! - Creation fields are immutable after creation
//!
//! Transaction time is client-supplied and not ordered, so no invariant
//! constrains `lastStatusUpdate`.

use super::audit::is_append_only;
use super::entities::EcgRecord;
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Status only moves forward along the escrow lifecycle.
#[must_use]
pub fn check_status_monotonic(before: &EcgRecord, after: &EcgRecord) -> bool {
    before.status == after.status || before.status.can_transition_to(after.status)
}

/// The owner is implicit, never a member; members are unique.
#[must_use]
pub fn check_authorized_set(record: &EcgRecord) -> bool {
    let mut seen = HashSet::with_capacity(record.authorized_users.len());
    record
        .authorized_users
        .iter()
        .all(|user| *user != record.owner && seen.insert(user))
}

/// Existing access records are never mutated, removed or reordered.
#[must_use]
pub fn check_history_append_only(before: &EcgRecord, after: &EcgRecord) -> bool {
    is_append_only(&before.access_history, &after.access_history)
}

/// Fields set at creation never change.
#[must_use]
pub fn check_immutable_fields(before: &EcgRecord, after: &EcgRecord) -> bool {
    before.patient_id == after.patient_id
        && before.content_hash == after.content_hash
        && before.original_timestamp == after.original_timestamp
        && before.metadata == after.metadata
        && before.owner == after.owner
        && before.input_by == after.input_by
        && before.created_at == after.created_at
}

/// Verification details exist exactly when the status is terminal, and are
/// never rewritten once set.
#[must_use]
pub fn check_verification_details(before: Option<&EcgRecord>, after: &EcgRecord) -> bool {
    let consistent = after.status.is_terminal() == after.verification_details.is_some();
    let unchanged = match before.and_then(|b| b.verification_details.as_ref()) {
        Some(details) => after.verification_details.as_ref() == Some(details),
        None => true,
    };
    consistent && unchanged
}

/// Check all invariants at once.
///
/// `before` is `None` for a freshly created record.
#[must_use]
pub fn check_all_invariants(before: Option<&EcgRecord>, after: &EcgRecord) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_authorized_set(after) {
        violations.push(InvariantViolation::AuthorizedSetCorrupted);
    }

    if !check_verification_details(before, after) {
        violations.push(InvariantViolation::VerificationDetailsMismatch);
    }

    if let Some(before) = before {
        if !check_status_monotonic(before, after) {
            violations.push(InvariantViolation::StatusRegressed {
                from: before.status.as_str(),
                to: after.status.as_str(),
            });
        }
        if !check_history_append_only(before, after) {
            violations.push(InvariantViolation::HistoryRewritten {
                before: before.access_history.len(),
                after: after.access_history.len(),
            });
        }
        if !check_immutable_fields(before, after) {
            violations.push(InvariantViolation::ImmutableFieldChanged);
        }
    }

    if violations.is_empty() {
        InvariantCheckResult::Passed
    } else {
        InvariantCheckResult::Failed(violations)
    }
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Result of invariant checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants passed.
    Passed,
    /// One or more invariants failed.
    Failed(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns the violations (empty if passed).
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        match self {
            Self::Passed => &[],
            Self::Failed(v) => v,
        }
    }
}

/// Specific invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    StatusRegressed {
        from: &'static str,
        to: &'static str,
    },
    AuthorizedSetCorrupted,
    HistoryRewritten {
        before: usize,
        after: usize,
    },
    ImmutableFieldChanged,
    VerificationDetailsMismatch,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusRegressed { from, to } => write!(f, "status moved from {from} to {to}"),
            Self::AuthorizedSetCorrupted => {
                write!(f, "authorizedUsers contains the owner or a duplicate")
            }
            Self::HistoryRewritten { before, after } => {
                write!(f, "accessHistory rewritten ({before} -> {after} entries)")
            }
            Self::ImmutableFieldChanged => write!(f, "an immutable field changed"),
            Self::VerificationDetailsMismatch => {
                write!(f, "verificationDetails inconsistent with status")
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
