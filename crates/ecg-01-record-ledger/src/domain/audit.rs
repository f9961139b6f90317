//! # Audit Trail
//!
//! Access records are appended on the read path and never mutated or
//! removed. Only the owner sees the full trail.

use super::entities::{EcgRecord, VerificationDetails};
use serde::{Deserialize, Serialize};
use shared_types::entities::{AccessType, LedgerTime};
use shared_types::identity::Identity;

/// One successful content read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
    #[serde(rename = "accessorID")]
    pub accessor_id: Identity,
    pub access_time: LedgerTime,
    pub access_type: AccessType,
    /// Hash that was disclosed by this read.
    pub content_hash: String,
}

/// Append one access record. The only way history grows.
pub fn record_access(
    record: &mut EcgRecord,
    accessor: Identity,
    access_type: AccessType,
    at: LedgerTime,
) -> AccessRecord {
    let entry = AccessRecord {
        accessor_id: accessor,
        access_time: at,
        access_type,
        content_hash: record.content_hash.clone(),
    };
    record.access_history.push(entry.clone());
    entry
}

/// Owner-only provenance view returned by `getAuditTrail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub owner: Identity,
    pub input_by: Identity,
    pub authorized_users: Vec<Identity>,
    pub access_history: Vec<AccessRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_details: Option<VerificationDetails>,
    pub created_at: LedgerTime,
    pub last_status_update: LedgerTime,
}

impl From<&EcgRecord> for AuditTrail {
    fn from(record: &EcgRecord) -> Self {
        Self {
            patient_id: record.patient_id.clone(),
            owner: record.owner.clone(),
            input_by: record.input_by.clone(),
            authorized_users: record.authorized_users.clone(),
            access_history: record.access_history.clone(),
            verification_details: record.verification_details.clone(),
            created_at: record.created_at,
            last_status_update: record.last_status_update,
        }
    }
}

/// True if `after` keeps every entry of `before` in place.
#[must_use]
pub fn is_append_only(before: &[AccessRecord], after: &[AccessRecord]) -> bool {
    after.len() >= before.len() && after[..before.len()] == *before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Metadata;
    use chrono::{Duration, TimeZone, Utc};
    use shared_types::entities::RecordStatus;

    fn record() -> EcgRecord {
        let t = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        EcgRecord {
            patient_id: "p1".to_string(),
            content_hash: "QmHash".to_string(),
            original_timestamp: String::new(),
            metadata: Metadata::default(),
            status: RecordStatus::Confirmed,
            owner: Identity::new("x509::CN=alice"),
            authorized_users: Vec::new(),
            input_by: Identity::new("x509::CN=alice"),
            verification_details: None,
            access_history: Vec::new(),
            created_at: t,
            last_status_update: t,
        }
    }

    #[test]
    fn test_record_access_appends_with_hash() {
        let mut rec = record();
        let at = rec.created_at + Duration::seconds(5);
        let entry = record_access(
            &mut rec,
            Identity::new("x509::CN=alice"),
            AccessType::OwnerAccess,
            at,
        );
        assert_eq!(rec.access_history, vec![entry.clone()]);
        assert_eq!(entry.content_hash, "QmHash");
        assert_eq!(entry.access_time, at);
    }

    #[test]
    fn test_is_append_only() {
        let mut rec = record();
        let before = rec.access_history.clone();
        let at = rec.created_at;
        record_access(&mut rec, Identity::new("a"), AccessType::OwnerAccess, at);
        assert!(is_append_only(&before, &rec.access_history));

        let grown = rec.access_history.clone();
        record_access(&mut rec, Identity::new("b"), AccessType::AuthorizedAccess, at);
        assert!(is_append_only(&grown, &rec.access_history));

        // Reordered or truncated history is rejected
        let mut reordered = rec.access_history.clone();
        reordered.reverse();
        assert!(!is_append_only(&rec.access_history, &reordered));
        assert!(!is_append_only(&rec.access_history, &grown[..1]));
    }

    #[test]
    fn test_audit_trail_wire_names() {
        let rec = record();
        let value = serde_json::to_value(AuditTrail::from(&rec)).unwrap();
        assert_eq!(value["patientID"], "p1");
        assert_eq!(value["inputBy"], "x509::CN=alice");
        assert!(value["accessHistory"].as_array().unwrap().is_empty());
    }
}
