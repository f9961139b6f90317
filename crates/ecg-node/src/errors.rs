//! Error types for the node's own components.

use ecg_01_record_ledger::errors::RecordError;
use shared_types::errors::PayloadError;
use thiserror::Error;

// =============================================================================
// CONTENT STORE ERRORS
// =============================================================================

/// Errors from the off-ledger content store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentStoreError {
    #[error("No content stored under {hash}")]
    NotFound { hash: String },

    #[error("Refusing to store empty content")]
    EmptyContent,

    #[error("Content store unavailable: {0}")]
    Unavailable(String),
}

impl ContentStoreError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

// =============================================================================
// VERIFIER ERRORS
// =============================================================================

/// Errors from the verification worker.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("Undecodable verification request: {0}")]
    Payload(#[from] PayloadError),

    #[error("Expected VERIFICATION_REQUESTED, got {0}")]
    UnexpectedEvent(String),

    #[error("Ledger rejected verification outcome: {0}")]
    Ledger(#[from] RecordError),
}

// =============================================================================
// GATEWAY ERRORS
// =============================================================================

/// Errors returned by the HTTP gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing {0} header")]
    MissingIdentity(&'static str),

    #[error("Missing required fields: {0}")]
    MissingFields(&'static str),

    #[error(transparent)]
    Ledger(#[from] RecordError),

    #[error(transparent)]
    Content(#[from] ContentStoreError),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Stable machine-readable category.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentity(_) => "MISSING_IDENTITY",
            Self::MissingFields(_) => "VALIDATION_ERROR",
            Self::Ledger(e) => e.code(),
            Self::Content(ContentStoreError::NotFound { .. }) => "CONTENT_NOT_FOUND",
            Self::Content(ContentStoreError::EmptyContent) => "VALIDATION_ERROR",
            Self::Content(ContentStoreError::Unavailable(_)) => "CONTENT_UNAVAILABLE",
            Self::Json(_) => "CODEC_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(ContentStoreError::Unavailable("down".into()).is_transient());
        assert!(!ContentStoreError::NotFound { hash: "h".into() }.is_transient());
        assert!(!ContentStoreError::EmptyContent.is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = ContentStoreError::NotFound { hash: "abc".into() };
        assert_eq!(err.to_string(), "No content stored under abc");
        let err = VerifierError::UnexpectedEvent("ACCESS_GRANTED".into());
        assert!(err.to_string().contains("ACCESS_GRANTED"));
    }

    #[test]
    fn test_gateway_error_codes() {
        let err = GatewayError::from(RecordError::NotFound {
            patient_id: "p1".into(),
        });
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "patient data for p1 not found");
        assert_eq!(
            GatewayError::MissingIdentity("x-ecg-identity").to_string(),
            "Missing x-ecg-identity header"
        );
        assert_eq!(
            GatewayError::from(ContentStoreError::Unavailable("down".into())).code(),
            "CONTENT_UNAVAILABLE"
        );
    }
}
