//! # Chaincode Dispatcher
//!
//! Maps host-runtime invocations `(functionName, [string args])` onto
//! `RecordLedgerApi` and renders each result as a JSON string.
//!
//! Legacy names (`storeECGData`, `accessECGData`, `getDataStatus`,
//! `getMyIdentity`) are accepted as aliases.

use crate::domain::entities::StoreRequest;
use crate::domain::value_objects::{Metadata, ValidityFlag};
use crate::errors::RecordError;
use crate::ports::inbound::RecordLedgerApi;
use crate::ports::outbound::TransactionContext;
use serde::Serialize;
use serde_json::json;
use shared_types::identity::Identity;
use tracing::{debug, info};

/// Every function name `invoke` understands.
pub const FUNCTIONS: [&str; 13] = [
    "initLedger",
    "storeRecord",
    "storeECGData",
    "confirmRecord",
    "grantAccess",
    "revokeAccess",
    "accessRecord",
    "accessECGData",
    "getStatus",
    "getDataStatus",
    "getAuditTrail",
    "whoAmI",
    "getMyIdentity",
];

/// String-argument front door to the ledger.
pub struct ChaincodeDispatcher<A: RecordLedgerApi> {
    api: A,
}

impl<A: RecordLedgerApi> ChaincodeDispatcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// The typed API behind this dispatcher.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Invoke `function` with positional string arguments.
    pub fn invoke<S: AsRef<str>>(
        &self,
        ctx: &dyn TransactionContext,
        function: &str,
        args: &[S],
    ) -> Result<String, RecordError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        debug!(function, argc = args.len(), tx_id = ctx.tx_id(), "Chaincode invocation");

        match function {
            "initLedger" => {
                expect_args(function, &args, 0)?;
                info!(tx_id = ctx.tx_id(), "ECG record ledger initialized");
                Ok(json!({ "status": "success", "message": "ledger initialized" }).to_string())
            }
            "storeRecord" | "storeECGData" => {
                expect_args(function, &args, 5)?;
                let request = StoreRequest {
                    patient_id: args[0].to_string(),
                    content_hash: args[1].to_string(),
                    original_timestamp: args[2].to_string(),
                    metadata: Metadata::parse(args[3])?,
                    owner: Identity::new(args[4].trim()),
                };
                let receipt = self.api.store_record(ctx, request)?;
                Ok(json!({
                    "status": "success",
                    "message": "ECG data stored successfully, awaiting verification",
                    "patientID": receipt.patient_id,
                    "owner": receipt.owner,
                    "recordStatus": receipt.status,
                    "overwritten": receipt.overwritten,
                })
                .to_string())
            }
            "confirmRecord" => {
                expect_args(function, &args, 3)?;
                let validity = ValidityFlag::parse(args[1])?;
                let status = self.api.confirm_record(ctx, args[0], validity, args[2])?;
                Ok(json!({
                    "status": "success",
                    "message": format!("Verification recorded for patient {}", args[0]),
                    "patientID": args[0],
                    "result": status,
                })
                .to_string())
            }
            "grantAccess" => {
                expect_args(function, &args, 2)?;
                self.api
                    .grant_access(ctx, args[0], Identity::new(args[1].trim()))?;
                Ok(json!({
                    "status": "success",
                    "message": format!(
                        "Access granted to {} for patient {}",
                        args[1].trim(),
                        args[0]
                    ),
                })
                .to_string())
            }
            "revokeAccess" => {
                expect_args(function, &args, 2)?;
                self.api
                    .revoke_access(ctx, args[0], Identity::new(args[1].trim()))?;
                Ok(json!({
                    "status": "success",
                    "message": format!(
                        "Access revoked for {} from patient {}",
                        args[1].trim(),
                        args[0]
                    ),
                })
                .to_string())
            }
            "accessRecord" | "accessECGData" => {
                expect_args(function, &args, 1)?;
                render(&self.api.access_record(ctx, args[0])?)
            }
            "getStatus" | "getDataStatus" => {
                expect_args(function, &args, 1)?;
                render(&self.api.get_status(ctx, args[0])?)
            }
            "getAuditTrail" => {
                expect_args(function, &args, 1)?;
                render(&self.api.get_audit_trail(ctx, args[0])?)
            }
            "whoAmI" | "getMyIdentity" => {
                expect_args(function, &args, 0)?;
                let identity = self.api.who_am_i(ctx);
                info!(client = %identity, "Client identity requested");
                Ok(identity.into_inner())
            }
            other => Err(RecordError::Validation(format!(
                "unknown function {other:?}"
            ))),
        }
    }
}

fn expect_args(function: &str, args: &[&str], expected: usize) -> Result<(), RecordError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RecordError::Validation(format!(
            "{function} expects {expected} argument(s), got {}",
            args.len()
        )))
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, RecordError> {
    serde_json::to_string(value).map_err(|e| RecordError::Codec(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
