//! # Value Objects
//!
//! Boundary types that normalize loosely-typed caller input before the state
//! machine sees it.

use crate::errors::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// VALIDITY FLAG
// =============================================================================

/// Strict boolean outcome of an off-ledger verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidityFlag(bool);

impl ValidityFlag {
    pub const VALID: Self = Self(true);
    pub const INVALID: Self = Self(false);

    /// Parse a bool-like argument.
    ///
    /// Accepts `true`/`false` in any case with surrounding whitespace, or
    /// `1`/`0`. Anything else is a validation error.
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
            Ok(Self::VALID)
        } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
            Ok(Self::INVALID)
        } else {
            Err(RecordError::Validation(format!(
                "isValid must be true/false or 1/0, got {raw:?}"
            )))
        }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0
    }
}

impl From<bool> for ValidityFlag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl fmt::Display for ValidityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// Immutable descriptive map attached to a record.
///
/// Keys are strings; values are JSON scalars (string, number, bool, null).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    /// Parse metadata from its JSON-encoded argument.
    ///
    /// An empty or blank string yields empty metadata.
    pub fn parse(json: &str) -> Result<Self, RecordError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(json)
            .map_err(|e| RecordError::Validation(format!("metadata is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Build from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let Value::Object(map) = value else {
            return Err(RecordError::Validation(
                "metadata must be a JSON object".to_string(),
            ));
        };

        let mut entries = BTreeMap::new();
        for (key, value) in map {
            if value.is_object() || value.is_array() {
                return Err(RecordError::Validation(format!(
                    "metadata value for {key:?} must be a scalar"
                )));
            }
            entries.insert(key, value);
        }
        Ok(Self(entries))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Text form of a value, for event excerpts. Null and missing yield `None`.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// INPUT CHECKS
// =============================================================================

/// Reject blank required arguments.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
