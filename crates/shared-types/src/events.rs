//! # Event Contract
//!
//! Notification payloads emitted by the record ledger for state transitions.
//!
//! Every payload is a JSON object with an `eventType` discriminator plus the
//! operation-specific fields below, so a consumer never needs a ledger lookup
//! to act on it.
//!
//! | Channel | `eventType` | Emitted by |
//! |---------|-------------|------------|
//! | `RecordStored` | `RECORD_STORED` | `storeRecord` |
//! | `VerificationRequested` | `VERIFICATION_REQUESTED` | `storeRecord` |
//! | `VerificationCompleted` | `VERIFICATION_COMPLETED` | `confirmRecord` |
//! | `AccessGranted` | `ACCESS_GRANTED` | `grantAccess` |
//! | `AccessRevoked` | `ACCESS_REVOKED` | `revokeAccess` |
//! | `DataAccessed` | `DATA_ACCESSED` | `accessRecord` |

use crate::entities::{AccessType, LedgerTime, RecordStatus};
use crate::errors::PayloadError;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

// =============================================================================
// PAYLOADS
// =============================================================================

/// A record was written in `PENDING_VERIFICATION`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStoredPayload {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub content_hash: String,
    pub status: RecordStatus,
    /// Excerpt of `metadata.hospital`, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    /// Excerpt of `metadata.doctor`, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    pub original_timestamp: String,
    pub input_by: Identity,
    pub owner: Identity,
    pub timestamp: LedgerTime,
}

/// Asks the external verification workflow to check the content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequestedPayload {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub content_hash: String,
    pub requested_by: Identity,
    /// How long the verifier should keep trying before giving up.
    pub timeout_seconds: u64,
    pub timestamp: LedgerTime,
}

/// The escrow phase ended with `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCompletedPayload {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub content_hash: String,
    pub result: RecordStatus,
    pub is_valid: bool,
    pub verified_by: Identity,
    pub details: String,
    pub timestamp: LedgerTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrantedPayload {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub granted_to: Identity,
    pub granted_by: Identity,
    pub timestamp: LedgerTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRevokedPayload {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub revoked_from: Identity,
    pub revoked_by: Identity,
    pub timestamp: LedgerTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAccessedPayload {
    #[serde(rename = "patientID")]
    pub patient_id: String,
    pub accessed_by: Identity,
    pub access_type: AccessType,
    pub content_hash: String,
    pub timestamp: LedgerTime,
}

// =============================================================================
// RECORD EVENT
// =============================================================================

/// All notifications the record ledger can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordEvent {
    RecordStored(RecordStoredPayload),
    VerificationRequested(VerificationRequestedPayload),
    VerificationCompleted(VerificationCompletedPayload),
    AccessGranted(AccessGrantedPayload),
    AccessRevoked(AccessRevokedPayload),
    DataAccessed(DataAccessedPayload),
}

impl RecordEvent {
    /// Channel (event name) this event is published on.
    #[must_use]
    pub fn channel(&self) -> &'static str {
        match self {
            Self::RecordStored(_) => channels::RECORD_STORED,
            Self::VerificationRequested(_) => channels::VERIFICATION_REQUESTED,
            Self::VerificationCompleted(_) => channels::VERIFICATION_COMPLETED,
            Self::AccessGranted(_) => channels::ACCESS_GRANTED,
            Self::AccessRevoked(_) => channels::ACCESS_REVOKED,
            Self::DataAccessed(_) => channels::DATA_ACCESSED,
        }
    }

    /// Value of the `eventType` discriminator.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        channels::event_type_for(self.channel()).unwrap_or_default()
    }

    /// Record key the event refers to.
    #[must_use]
    pub fn patient_id(&self) -> &str {
        match self {
            Self::RecordStored(p) => &p.patient_id,
            Self::VerificationRequested(p) => &p.patient_id,
            Self::VerificationCompleted(p) => &p.patient_id,
            Self::AccessGranted(p) => &p.patient_id,
            Self::AccessRevoked(p) => &p.patient_id,
            Self::DataAccessed(p) => &p.patient_id,
        }
    }

    /// Ledger transaction time of the transition.
    #[must_use]
    pub fn timestamp(&self) -> LedgerTime {
        match self {
            Self::RecordStored(p) => p.timestamp,
            Self::VerificationRequested(p) => p.timestamp,
            Self::VerificationCompleted(p) => p.timestamp,
            Self::AccessGranted(p) => p.timestamp,
            Self::AccessRevoked(p) => p.timestamp,
            Self::DataAccessed(p) => p.timestamp,
        }
    }

    /// Serialize to the JSON bytes handed to the transport.
    pub fn to_payload(&self) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(self).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// Decode a payload received on `channel`.
    ///
    /// Rejects payloads whose `eventType` does not belong to `channel`.
    pub fn decode(channel: &str, payload: &[u8]) -> Result<Self, PayloadError> {
        if channels::event_type_for(channel).is_none() {
            return Err(PayloadError::UnknownChannel(channel.to_string()));
        }
        let event: Self =
            serde_json::from_slice(payload).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        if event.channel() != channel {
            return Err(PayloadError::ChannelMismatch {
                channel: channel.to_string(),
                event_type: event.event_type().to_string(),
            });
        }
        Ok(event)
    }
}

// =============================================================================
// CHANNELS
// =============================================================================

/// Event names used on the transport.
pub mod channels {
    pub const RECORD_STORED: &str = "RecordStored";
    pub const VERIFICATION_REQUESTED: &str = "VerificationRequested";
    pub const VERIFICATION_COMPLETED: &str = "VerificationCompleted";
    pub const ACCESS_GRANTED: &str = "AccessGranted";
    pub const ACCESS_REVOKED: &str = "AccessRevoked";
    pub const DATA_ACCESSED: &str = "DataAccessed";

    /// Every channel of the contract, in lifecycle order.
    pub const ALL: [&str; 6] = [
        RECORD_STORED,
        VERIFICATION_REQUESTED,
        VERIFICATION_COMPLETED,
        ACCESS_GRANTED,
        ACCESS_REVOKED,
        DATA_ACCESSED,
    ];

    /// `eventType` discriminator carried on `channel`.
    #[must_use]
    pub fn event_type_for(channel: &str) -> Option<&'static str> {
        match channel {
            RECORD_STORED => Some("RECORD_STORED"),
            VERIFICATION_REQUESTED => Some("VERIFICATION_REQUESTED"),
            VERIFICATION_COMPLETED => Some("VERIFICATION_COMPLETED"),
            ACCESS_GRANTED => Some("ACCESS_GRANTED"),
            ACCESS_REVOKED => Some("ACCESS_REVOKED"),
            DATA_ACCESSED => Some("DATA_ACCESSED"),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
