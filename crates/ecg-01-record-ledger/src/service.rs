//! # Record Ledger Service
//!
//! Thin unit of work around the pure transitions:
//!
//! 1. Load the record through the `RecordStore`
//! 2. Apply the transition under the caller's transaction context
//! 3. Check record invariants on the `(before, after)` pair
//! 4. Write the record back (the commit point)
//! 5. Emit the transition's events through the `EventSink`
//!
//! Any error before step 4 leaves the store untouched and emits nothing.

use crate::domain::audit::AuditTrail;
use crate::domain::entities::{
    AccessResponse, EcgRecord, LedgerPolicy, StatusView, StoreReceipt, StoreRequest,
};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult};
use crate::domain::transitions::{self, Transition};
use crate::domain::value_objects::{require_non_empty, ValidityFlag};
use crate::errors::RecordError;
use crate::ports::inbound::RecordLedgerApi;
use crate::ports::outbound::{EventSink, RecordStore, TransactionContext};
use shared_types::entities::RecordStatus;
use shared_types::identity::Identity;
use std::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Counters for the record ledger service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Mutating operations written to the store.
    pub operations_committed: u64,
    /// Operations rejected with a caller error.
    pub operations_rejected: u64,
    /// Events handed to the sink.
    pub events_emitted: u64,
    /// Sink failures after a successful write.
    pub emit_failures: u64,
}

/// The record ledger.
pub struct RecordService<S: RecordStore, E: EventSink> {
    policy: LedgerPolicy,
    store: S,
    sink: E,
    stats: Mutex<ServiceStats>,
}

impl<S: RecordStore, E: EventSink> RecordService<S, E> {
    pub fn new(store: S, sink: E, policy: LedgerPolicy) -> Self {
        Self {
            policy,
            store,
            sink,
            stats: Mutex::new(ServiceStats::default()),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Snapshot of the service counters.
    pub fn stats(&self) -> ServiceStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Unit of work
    // -------------------------------------------------------------------------

    fn load_optional(&self, patient_id: &str) -> Result<Option<EcgRecord>, RecordError> {
        require_non_empty("patientID", patient_id)?;
        match self.store.get_state(patient_id)? {
            Some(bytes) => Ok(Some(EcgRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load(&self, patient_id: &str) -> Result<EcgRecord, RecordError> {
        self.load_optional(patient_id)?
            .ok_or_else(|| RecordError::NotFound {
                patient_id: patient_id.to_string(),
            })
    }

    fn commit<T>(
        &self,
        ctx: &dyn TransactionContext,
        before: Option<&EcgRecord>,
        transition: Transition<T>,
    ) -> Result<T, RecordError> {
        let Transition {
            record,
            events,
            output,
        } = transition;

        if let InvariantCheckResult::Failed(violations) = check_all_invariants(before, &record) {
            let reasons = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            error!(
                patient_id = %record.patient_id,
                %reasons,
                "Transition rejected by invariant check"
            );
            return Err(RecordError::InvariantViolation(reasons));
        }

        self.store.put_state(&record.patient_id, record.to_bytes()?)?;

        let emitted = match self.sink.emit(ctx.tx_id(), &events) {
            Ok(()) => events.len() as u64,
            Err(e) => {
                // The write already committed; report and move on.
                error!(
                    tx_id = ctx.tx_id(),
                    patient_id = %record.patient_id,
                    error = %e,
                    "Event emission failed after commit"
                );
                self.bump(|s| s.emit_failures += 1);
                0
            }
        };
        self.bump(|s| {
            s.operations_committed += 1;
            s.events_emitted += emitted;
        });

        debug!(
            tx_id = ctx.tx_id(),
            patient_id = %record.patient_id,
            status = %record.status,
            events = emitted,
            "Record committed"
        );
        Ok(output)
    }

    fn finish<T>(
        &self,
        action: &'static str,
        result: Result<T, RecordError>,
    ) -> Result<T, RecordError> {
        if let Err(e) = &result {
            if e.is_caller_error() {
                self.bump(|s| s.operations_rejected += 1);
                warn!(action, code = e.code(), error = %e, "Operation rejected");
            } else {
                error!(action, code = e.code(), error = %e, "Operation failed");
            }
        }
        result
    }

    fn bump(&self, f: impl FnOnce(&mut ServiceStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            f(&mut stats);
        }
    }
}

impl<S: RecordStore, E: EventSink> RecordLedgerApi for RecordService<S, E> {
    #[instrument(
        skip_all,
        fields(patient_id = %request.patient_id, caller = %ctx.client_identity())
    )]
    fn store_record(
        &self,
        ctx: &dyn TransactionContext,
        request: StoreRequest,
    ) -> Result<StoreReceipt, RecordError> {
        let result = (|| -> Result<StoreReceipt, RecordError> {
            let existing = self.load_optional(&request.patient_id)?;
            let transition = transitions::store_record(
                existing.as_ref(),
                request,
                ctx.client_identity(),
                ctx.tx_timestamp(),
                &self.policy,
            )?;
            // An overwrite starts a fresh lifecycle; it is not a transition
            // of the old record.
            let receipt = self.commit(ctx, None, transition)?;
            if receipt.overwritten {
                warn!(patient_id = %receipt.patient_id, "Existing record overwritten");
            }
            info!(
                patient_id = %receipt.patient_id,
                owner = %receipt.owner,
                "ECG record stored, awaiting verification"
            );
            Ok(receipt)
        })();
        self.finish("store", result)
    }

    #[instrument(skip_all, fields(patient_id = %patient_id, caller = %ctx.client_identity()))]
    fn confirm_record(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        validity: ValidityFlag,
        details: &str,
    ) -> Result<RecordStatus, RecordError> {
        let result = (|| -> Result<RecordStatus, RecordError> {
            let before = self.load(patient_id)?;
            let transition = transitions::confirm_record(
                before.clone(),
                validity,
                details,
                ctx.client_identity(),
                ctx.tx_timestamp(),
            )?;
            let status = self.commit(ctx, Some(&before), transition)?;
            info!(patient_id, %status, "Verification completed");
            Ok(status)
        })();
        self.finish("confirm", result)
    }

    #[instrument(
        skip_all,
        fields(patient_id = %patient_id, caller = %ctx.client_identity(), grantee = %grantee)
    )]
    fn grant_access(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        grantee: Identity,
    ) -> Result<(), RecordError> {
        let result = (|| -> Result<(), RecordError> {
            let before = self.load(patient_id)?;
            let transition = transitions::grant_access(
                before.clone(),
                grantee,
                ctx.client_identity(),
                ctx.tx_timestamp(),
                &self.policy,
            )?;
            self.commit(ctx, Some(&before), transition)?;
            info!(patient_id, "Access granted");
            Ok(())
        })();
        self.finish("grant", result)
    }

    #[instrument(
        skip_all,
        fields(patient_id = %patient_id, caller = %ctx.client_identity(), revokee = %revokee)
    )]
    fn revoke_access(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
        revokee: Identity,
    ) -> Result<(), RecordError> {
        let result = (|| -> Result<(), RecordError> {
            let before = self.load(patient_id)?;
            let transition = transitions::revoke_access(
                before.clone(),
                revokee,
                ctx.client_identity(),
                ctx.tx_timestamp(),
                &self.policy,
            )?;
            self.commit(ctx, Some(&before), transition)?;
            info!(patient_id, "Access revoked");
            Ok(())
        })();
        self.finish("revoke", result)
    }

    #[instrument(skip_all, fields(patient_id = %patient_id, caller = %ctx.client_identity()))]
    fn access_record(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<AccessResponse, RecordError> {
        let result = (|| -> Result<AccessResponse, RecordError> {
            let before = self.load(patient_id)?;
            let transition = transitions::access_record(
                before.clone(),
                ctx.client_identity(),
                ctx.tx_timestamp(),
            )?;
            let response = self.commit(ctx, Some(&before), transition)?;
            info!(patient_id, "Content pointer disclosed");
            Ok(response)
        })();
        self.finish("access", result)
    }

    #[instrument(skip_all, fields(patient_id = %patient_id, caller = %ctx.client_identity()))]
    fn get_status(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<StatusView, RecordError> {
        let result = self
            .load(patient_id)
            .and_then(|record| transitions::status_view(&record, ctx.client_identity()));
        self.finish("status", result)
    }

    #[instrument(skip_all, fields(patient_id = %patient_id, caller = %ctx.client_identity()))]
    fn get_audit_trail(
        &self,
        ctx: &dyn TransactionContext,
        patient_id: &str,
    ) -> Result<AuditTrail, RecordError> {
        let result = self
            .load(patient_id)
            .and_then(|record| transitions::audit_trail(&record, ctx.client_identity()));
        self.finish("audit", result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
