//! # Driving Ports (API - Inbound)
//!
//! The public API of the record ledger. The chaincode dispatcher adapter and
//! in-process callers use this trait; every operation runs under the
//! caller's transaction context.

use crate::domain::audit::AuditTrail;
use crate::domain::entities::{AccessResponse, StatusView, StoreReceipt, StoreRequest};
use crate::domain::value_objects::ValidityFlag;
use crate::errors::RecordError;
use crate::ports::outbound::TransactionContext;
use shared_types::entities::RecordStatus;
use shared_types::identity::Identity;
use std::sync::Arc;

/// Record ledger operations.
pub trait RecordLedgerApi: Send + Sync {
    /// Create a record in `PENDING_VERIFICATION`.
    fn store_record(
        &self,
        ctx: &dyn TransactionContext,
        request: StoreRequest,
    ) -> Result<StoreReceipt, RecordError>;

    /// Close the escrow phase with a verification outcome.
    fn confirm_record(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        validity: ValidityFlag,
        details: &str,
    ) -> Result<RecordStatus, RecordError>;

    /// Owner grants read access to a confirmed record.
    fn grant_access(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        grantee: Identity,
    ) -> Result<(), RecordError>;

    /// Owner removes read access.
    fn revoke_access(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        revokee: Identity,
    ) -> Result<(), RecordError>;

    /// Read the content pointer. Appends to the audit trail.
    fn access_record(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<AccessResponse, RecordError>;

    /// Status summary for the owner or an authorized user.
    fn get_status(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<StatusView, RecordError>;

    /// Full provenance for the owner.
    fn get_audit_trail(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<AuditTrail, RecordError>;

    /// The caller's own identity.
    fn who_am_i(&self, ctx: &dyn TransactionContext) -> Identity {
        ctx.client_identity().clone()
    }
}

impl<T: RecordLedgerApi + ?Sized> RecordLedgerApi for Arc<T> {
    fn store_record(
        &self,
        ctx: &dyn TransactionContext,
        request: StoreRequest,
    ) -> Result<StoreReceipt, RecordError> {
        (**self).store_record(ctx, request)
    }

    fn confirm_record(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        validity: ValidityFlag,
        details: &str,
    ) -> Result<RecordStatus, RecordError> {
        (**self).confirm_record(ctx, patient_id, validity, details)
    }

    fn grant_access(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        grantee: Identity,
    ) -> Result<(), RecordError> {
        (**self).grant_access(ctx, patient_id, grantee)
    }

    fn revoke_access(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        revokee: Identity,
    ) -> Result<(), RecordError> {
        (**self).revoke_access(ctx, patient_id, revokee)
    }

    fn access_record(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<AccessResponse, RecordError> {
        (**self).access_record(ctx, patient_id)
    }

    fn get_status(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<StatusView, RecordError> {
        (**self).get_status(ctx, patient_id)
    }

    fn get_audit_trail(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<AuditTrail, RecordError> {
        (**self).get_audit_trail(ctx, patient_id)
    }

    fn who_am_i(&self, ctx: &dyn TransactionContext) -> Identity {
        (**self).who_am_i(ctx)
    }
}
