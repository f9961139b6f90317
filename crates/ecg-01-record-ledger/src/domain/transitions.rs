//! # Record Transitions
//!
//! Pure state-machine functions. Each takes the current record, the caller
//! identity and the ledger transaction time, and returns the new record plus
//! the events to emit once it is written. No I/O happens here.

use super::audit::{record_access, AuditTrail};
use super::entities::{
    AccessResponse, AccessorInfo, EcgRecord, LedgerPolicy, StatusView, StoreReceipt,
    StoreRequest, VerificationDetails,
};
use super::value_objects::{require_non_empty, ValidityFlag};
use crate::errors::RecordError;
use shared_types::entities::{LedgerTime, RecordStatus};
use shared_types::events::{
    AccessGrantedPayload, AccessRevokedPayload, DataAccessedPayload, RecordEvent,
    RecordStoredPayload, VerificationCompletedPayload, VerificationRequestedPayload,
};
use shared_types::identity::Identity;

/// Outcome of a mutating operation, not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    /// Record to write back under its key.
    pub record: EcgRecord,
    /// Events to emit after the write succeeds, in order.
    pub events: Vec<RecordEvent>,
    /// Value returned to the caller.
    pub output: T,
}

// =============================================================================
// CREATE
// =============================================================================

/// `storeRecord`: write a new record in `PENDING_VERIFICATION`.
pub fn store_record(
    existing: Option<&EcgRecord>,
    request: StoreRequest,
    caller: &Identity,
    now: LedgerTime,
    policy: &LedgerPolicy,
) -> Result<Transition<StoreReceipt>, RecordError> {
    require_non_empty("patientID", &request.patient_id)?;
    require_non_empty("contentHash", &request.content_hash)?;
    if request.owner.is_empty() {
        return Err(RecordError::Validation(
            "owner identity must not be empty".to_string(),
        ));
    }
    if existing.is_some() && !policy.allow_overwrite {
        return Err(RecordError::Conflict(format!(
            "patient data for {} already exists",
            request.patient_id
        )));
    }

    let record = EcgRecord {
        patient_id: request.patient_id,
        content_hash: request.content_hash,
        original_timestamp: request.original_timestamp,
        metadata: request.metadata,
        status: RecordStatus::PendingVerification,
        owner: request.owner,
        authorized_users: Vec::new(),
        input_by: caller.clone(),
        verification_details: None,
        access_history: Vec::new(),
        created_at: now,
        last_status_update: now,
    };

    let events = vec![
        RecordEvent::RecordStored(RecordStoredPayload {
            patient_id: record.patient_id.clone(),
            content_hash: record.content_hash.clone(),
            status: record.status,
            hospital: record.metadata.text("hospital"),
            doctor: record.metadata.text("doctor"),
            original_timestamp: record.original_timestamp.clone(),
            input_by: record.input_by.clone(),
            owner: record.owner.clone(),
            timestamp: now,
        }),
        RecordEvent::VerificationRequested(VerificationRequestedPayload {
            patient_id: record.patient_id.clone(),
            content_hash: record.content_hash.clone(),
            requested_by: caller.clone(),
            timeout_seconds: policy.verification_timeout_secs,
            timestamp: now,
        }),
    ];

    let output = StoreReceipt {
        patient_id: record.patient_id.clone(),
        owner: record.owner.clone(),
        status: record.status,
        overwritten: existing.is_some(),
    };

    Ok(Transition {
        record,
        events,
        output,
    })
}

// =============================================================================
// VERIFY
// =============================================================================

/// `confirmRecord`: close the escrow phase exactly once.
pub fn confirm_record(
    mut record: EcgRecord,
    validity: ValidityFlag,
    details: &str,
    caller: &Identity,
    now: LedgerTime,
) -> Result<Transition<RecordStatus>, RecordError> {
    if record.status != RecordStatus::PendingVerification {
        return Err(RecordError::InvalidState {
            patient_id: record.patient_id,
            action: "confirm",
            status: record.status,
        });
    }

    let result = if validity.is_valid() {
        RecordStatus::Confirmed
    } else {
        RecordStatus::Failed
    };

    record.status = result;
    record.last_status_update = now;
    record.verification_details = Some(VerificationDetails {
        verifier: caller.clone(),
        verified_at: now,
        is_valid: validity.is_valid(),
        details: details.to_string(),
    });

    let events = vec![RecordEvent::VerificationCompleted(
        VerificationCompletedPayload {
            patient_id: record.patient_id.clone(),
            content_hash: record.content_hash.clone(),
            result,
            is_valid: validity.is_valid(),
            verified_by: caller.clone(),
            details: details.to_string(),
            timestamp: now,
        },
    )];

    Ok(Transition {
        record,
        events,
        output: result,
    })
}

// =============================================================================
// GRANT / REVOKE
// =============================================================================

/// `grantAccess`: owner adds a reader to a confirmed record.
pub fn grant_access(
    mut record: EcgRecord,
    grantee: Identity,
    caller: &Identity,
    now: LedgerTime,
    policy: &LedgerPolicy,
) -> Result<Transition<()>, RecordError> {
    require_owner(&record, caller, "grant access to")?;
    require_confirmed(&record, "grant access to")?;
    policy.check_identity("grantee", &grantee)?;
    if record.is_owner(&grantee) {
        return Err(RecordError::Validation(
            "the owner already has implicit access".to_string(),
        ));
    }
    if record.is_authorized(&grantee) {
        return Err(RecordError::Conflict(format!(
            "{grantee} already has access to patient data {}",
            record.patient_id
        )));
    }

    record.authorized_users.push(grantee.clone());
    record.last_status_update = now;

    let events = vec![RecordEvent::AccessGranted(AccessGrantedPayload {
        patient_id: record.patient_id.clone(),
        granted_to: grantee,
        granted_by: caller.clone(),
        timestamp: now,
    })];

    Ok(Transition {
        record,
        events,
        output: (),
    })
}

/// `revokeAccess`: owner removes a reader from a confirmed record.
pub fn revoke_access(
    mut record: EcgRecord,
    revokee: Identity,
    caller: &Identity,
    now: LedgerTime,
    policy: &LedgerPolicy,
) -> Result<Transition<()>, RecordError> {
    require_owner(&record, caller, "revoke access to")?;
    require_confirmed(&record, "revoke access to")?;
    policy.check_identity("revokee", &revokee)?;

    let Some(position) = record.authorized_users.iter().position(|u| *u == revokee) else {
        return Err(RecordError::GranteeNotFound {
            patient_id: record.patient_id,
            identity: revokee.into_inner(),
        });
    };

    record.authorized_users.remove(position);
    record.last_status_update = now;

    let events = vec![RecordEvent::AccessRevoked(AccessRevokedPayload {
        patient_id: record.patient_id.clone(),
        revoked_from: revokee,
        revoked_by: caller.clone(),
        timestamp: now,
    })];

    Ok(Transition {
        record,
        events,
        output: (),
    })
}

// =============================================================================
// READ
// =============================================================================

/// `accessRecord`: disclose the content pointer and log the read.
///
/// Status is checked before the caller, so an unconfirmed record is
/// `InvalidState` for everyone, including the owner.
pub fn access_record(
    mut record: EcgRecord,
    caller: &Identity,
    now: LedgerTime,
) -> Result<Transition<AccessResponse>, RecordError> {
    if record.status != RecordStatus::Confirmed {
        return Err(RecordError::InvalidState {
            patient_id: record.patient_id,
            action: "access",
            status: record.status,
        });
    }
    let Some(access_type) = record.access_type_for(caller) else {
        return Err(unauthorized(&record, caller, "access"));
    };

    let entry = record_access(&mut record, caller.clone(), access_type, now);
    record.last_status_update = now;

    let events = vec![RecordEvent::DataAccessed(DataAccessedPayload {
        patient_id: record.patient_id.clone(),
        accessed_by: caller.clone(),
        access_type,
        content_hash: record.content_hash.clone(),
        timestamp: now,
    })];

    let output = AccessResponse {
        patient_id: record.patient_id.clone(),
        content_hash: record.content_hash.clone(),
        original_timestamp: record.original_timestamp.clone(),
        metadata: record.metadata.clone(),
        status: record.status,
        verification_details: record.verification_details.clone(),
        access_granted: true,
        accessor_info: AccessorInfo {
            id: entry.accessor_id,
            access_time: entry.access_time,
        },
    };

    Ok(Transition {
        record,
        events,
        output,
    })
}

/// `getStatus`: owner or authorized users, any status.
pub fn status_view(record: &EcgRecord, caller: &Identity) -> Result<StatusView, RecordError> {
    if record.access_type_for(caller).is_none() {
        return Err(unauthorized(record, caller, "view the status of"));
    }
    Ok(StatusView::from(record))
}

/// `getAuditTrail`: owner only.
pub fn audit_trail(record: &EcgRecord, caller: &Identity) -> Result<AuditTrail, RecordError> {
    require_owner(record, caller, "view the audit trail of")?;
    Ok(AuditTrail::from(record))
}

// =============================================================================
// HELPERS
// =============================================================================

fn require_owner(
    record: &EcgRecord,
    caller: &Identity,
    action: &'static str,
) -> Result<(), RecordError> {
    if record.is_owner(caller) {
        Ok(())
    } else {
        Err(unauthorized(record, caller, action))
    }
}

fn require_confirmed(record: &EcgRecord, action: &'static str) -> Result<(), RecordError> {
    if record.status == RecordStatus::Confirmed {
        Ok(())
    } else {
        Err(RecordError::InvalidState {
            patient_id: record.patient_id.clone(),
            action,
            status: record.status,
        })
    }
}

fn unauthorized(record: &EcgRecord, caller: &Identity, action: &'static str) -> RecordError {
    RecordError::Unauthorized {
        caller: caller.to_string(),
        action,
        patient_id: record.patient_id.clone(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
