//! # Domain Entities
//!
//! The ledger record, its verification outcome and the views returned to
//! callers.

use super::audit::AccessRecord;
use super::value_objects::Metadata;
use crate::errors::RecordError;
use serde::{Deserialize, Serialize};
use shared_types::entities::{AccessType, LedgerTime, RecordStatus};
use shared_types::identity::{Identity, X509_PREFIX};

// =============================================================================
// LEDGER POLICY
// =============================================================================

/// Tunable rules applied by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Required prefix for grant and revoke targets.
    pub identity_prefix: String,
    /// Timeout hint carried by `VerificationRequested`.
    pub verification_timeout_secs: u64,
    /// Let `storeRecord` replace an existing record instead of failing.
    pub allow_overwrite: bool,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            identity_prefix: X509_PREFIX.to_string(),
            verification_timeout_secs: 300,
            allow_overwrite: false,
        }
    }
}

impl LedgerPolicy {
    /// Check that a grant/revoke target is a well-formed identity reference.
    pub fn check_identity(&self, field: &str, identity: &Identity) -> Result<(), RecordError> {
        if identity.has_prefix(&self.identity_prefix) {
            Ok(())
        } else {
            Err(RecordError::Validation(format!(
                "{field} must be a full identity starting with {:?}, got {:?}",
                self.identity_prefix,
                identity.as_str()
            )))
        }
    }
}

// =============================================================================
// VERIFICATION DETAILS
// =============================================================================

/// Outcome of the escrow phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetails {
    /// Identity that called `confirmRecord`.
    pub verifier: Identity,
    /// Ledger transaction time of the confirmation.
    pub verified_at: LedgerTime,
    pub is_valid: bool,
    pub details: String,
}

// =============================================================================
// ECG RECORD
// =============================================================================

/// One record per patient key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcgRecord {
    /// Equals the record key.
    #[serde(rename = "patientID")]
    pub patient_id: String,
    /// Pointer to off-ledger content.
    pub content_hash: String,
    /// Caller-supplied capture time. Never used for authorization.
    pub original_timestamp: String,
    pub metadata: Metadata,
    pub status: RecordStatus,
    pub owner: Identity,
    /// Never contains `owner`, never has duplicates.
    pub authorized_users: Vec<Identity>,
    pub input_by: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_details: Option<VerificationDetails>,
    /// Append-only.
    pub access_history: Vec<AccessRecord>,
    pub created_at: LedgerTime,
    pub last_status_update: LedgerTime,
}

impl EcgRecord {
    #[must_use]
    pub fn is_owner(&self, identity: &Identity) -> bool {
        self.owner == *identity
    }

    #[must_use]
    pub fn is_authorized(&self, identity: &Identity) -> bool {
        self.authorized_users.contains(identity)
    }

    /// How `identity` is entitled to read, if at all.
    #[must_use]
    pub fn access_type_for(&self, identity: &Identity) -> Option<AccessType> {
        if self.is_owner(identity) {
            Some(AccessType::OwnerAccess)
        } else if self.is_authorized(identity) {
            Some(AccessType::AuthorizedAccess)
        } else {
            None
        }
    }

    /// Content may be read once verification confirmed it.
    #[must_use]
    pub fn ready_for_content_access(&self) -> bool {
        self.status == RecordStatus::Confirmed
    }

    /// Encode for the record store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        serde_json::to_vec(self).map_err(|e| RecordError::Codec(e.to_string()))
    }

    /// Decode a blob read from the record store.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        serde_json::from_slice(bytes).map_err(|e| RecordError::Codec(e.to_string()))
    }
}

// =============================================================================
// REQUESTS AND VIEWS
// =============================================================================

/// Arguments of `storeRecord`, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub patient_id: String,
    pub content_hash: String,
    pub original_timestamp: String,
    pub metadata: Metadata,
    pub owner: Identity,
}

/// Result of a successful `storeRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReceipt {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub owner: Identity,
    pub status: RecordStatus,
    /// True if an existing record was replaced.
    pub overwritten: bool,
}

/// The accessor's own entry, echoed back by `accessRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorInfo {
    pub id: Identity,
    pub access_time: LedgerTime,
}

/// Result of `accessRecord`. Never discloses `owner` or `authorizedUsers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub content_hash: String,
    pub original_timestamp: String,
    pub metadata: Metadata,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_details: Option<VerificationDetails>,
    pub access_granted: bool,
    pub accessor_info: AccessorInfo,
}

/// Result of `getStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub status: RecordStatus,
    pub created_at: LedgerTime,
    pub last_status_update: LedgerTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_details: Option<VerificationDetails>,
    pub ready_for_content_access: bool,
}

impl From<&EcgRecord> for StatusView {
    fn from(record: &EcgRecord) -> Self {
        Self {
            patient_id: record.patient_id.clone(),
            status: record.status,
            created_at: record.created_at,
            last_status_update: record.last_status_update,
            verification_details: record.verification_details.clone(),
            ready_for_content_access: record.ready_for_content_access(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record() -> EcgRecord {
        let t = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        EcgRecord {
            patient_id: "PAT001".to_string(),
            content_hash: "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".to_string(),
            original_timestamp: "2025-06-02T08:59:00Z".to_string(),
            metadata: Metadata::parse(r#"{"hospital":"A"}"#).unwrap(),
            status: RecordStatus::PendingVerification,
            owner: Identity::new("x509::CN=alice"),
            authorized_users: vec![Identity::new("x509::CN=bob")],
            input_by: Identity::new("x509::CN=admin"),
            verification_details: None,
            access_history: Vec::new(),
            created_at: t,
            last_status_update: t,
        }
    }

    #[test]
    fn test_access_type_for() {
        let rec = record();
        assert_eq!(
            rec.access_type_for(&Identity::new("x509::CN=alice")),
            Some(AccessType::OwnerAccess)
        );
        assert_eq!(
            rec.access_type_for(&Identity::new("x509::CN=bob")),
            Some(AccessType::AuthorizedAccess)
        );
        assert_eq!(rec.access_type_for(&Identity::new("x509::CN=eve")), None);
    }

    #[test]
    fn test_record_bytes_round_trip_uses_wire_names() {
        let rec = record();
        let bytes = rec.to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["patientID"], "PAT001");
        assert_eq!(value["status"], "PENDING_VERIFICATION");
        assert_eq!(value["authorizedUsers"][0], "x509::CN=bob");
        assert!(value.get("verificationDetails").is_none());

        assert_eq!(EcgRecord::from_bytes(&bytes).unwrap(), rec);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(matches!(
            EcgRecord::from_bytes(b"{\"patientID\":1}"),
            Err(RecordError::Codec(_))
        ));
    }

    #[test]
    fn test_status_view_ready_flag() {
        let mut rec = record();
        assert!(!StatusView::from(&rec).ready_for_content_access);
        rec.status = RecordStatus::Confirmed;
        assert!(StatusView::from(&rec).ready_for_content_access);
    }

    #[test]
    fn test_policy_identity_check() {
        let policy = LedgerPolicy::default();
        assert!(policy
            .check_identity("grantee", &Identity::new("x509::CN=doc1"))
            .is_ok());
        assert!(matches!(
            policy.check_identity("grantee", &Identity::new("CN=doc1")),
            Err(RecordError::Validation(_))
        ));
        assert!(policy.check_identity("grantee", &Identity::new("")).is_err());
    }
}
