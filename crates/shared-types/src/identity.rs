//! # Caller Identity
//!
//! Identities are opaque strings produced by the certificate system, e.g.
//! `x509::/C=US/ST=North Carolina/CN=User1@org1.example.com::/C=US/CN=ca.org1.example.com`.
//! The ledger only ever compares them for equality. Two helpers read into
//! them: the prefix check for grant/revoke targets and the display-name
//! extraction used by alert rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of a full X.509 client identity string.
pub const X509_PREFIX: &str = "x509::";

/// Placeholder shown when an identity is missing.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// Opaque, comparable caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// True if the identity starts with `prefix` and has something after it.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0
            .strip_prefix(prefix)
            .is_some_and(|rest| !rest.trim().is_empty())
    }

    /// Canonical-name component, if the identity carries one.
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        common_name(&self.0)
    }

    /// Short name for human-facing output.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(Some(&self.0))
    }

    /// Consume into the raw string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract the text after the first `CN=`, cut at the first `,` and then at
/// the first `::`.
#[must_use]
pub fn common_name(raw: &str) -> Option<&str> {
    let (_, after) = raw.split_once("CN=")?;
    let cn = after.split(',').next().unwrap_or(after);
    Some(cn.split("::").next().unwrap_or(cn))
}

/// Display name for a possibly-missing identity string.
///
/// Falls back to the raw string when it has no `CN=` component and to
/// [`UNKNOWN_IDENTITY`] when it is absent or empty.
#[must_use]
pub fn display_name(raw: Option<&str>) -> String {
    match raw {
        Some(raw) if !raw.is_empty() => common_name(raw).unwrap_or(raw).to_string(),
        _ => UNKNOWN_IDENTITY.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FABRIC_ID: &str = concat!(
        "x509::/C=US/ST=North Carolina/O=Hyperledger/OU=client/CN=User1@org1.example.com",
        "::/C=US/ST=North Carolina/L=Durham/O=org1.example.com/CN=ca.org1.example.com"
    );

    #[test]
    fn test_common_name_from_fabric_identity() {
        let id = Identity::new(FABRIC_ID);
        assert_eq!(id.common_name(), Some("User1@org1.example.com"));
        assert_eq!(id.display_name(), "User1@org1.example.com");
    }

    #[test]
    fn test_common_name_cut_at_comma() {
        assert_eq!(
            common_name("x509::CN=DrSmith,OU=cardiology::CN=ca"),
            Some("DrSmith")
        );
        assert_eq!(common_name("x509::CN=doc1"), Some("doc1"));
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(Some("plain-user")), "plain-user");
        assert_eq!(display_name(Some("")), UNKNOWN_IDENTITY);
        assert_eq!(display_name(None), UNKNOWN_IDENTITY);
    }

    #[test]
    fn test_prefix_check() {
        assert!(Identity::new("x509::CN=bob").has_prefix(X509_PREFIX));
        assert!(!Identity::new("x509::").has_prefix(X509_PREFIX));
        assert!(!Identity::new("x509::   ").has_prefix(X509_PREFIX));
        assert!(!Identity::new("CN=bob").has_prefix(X509_PREFIX));
        assert!(!Identity::new("").has_prefix(X509_PREFIX));
    }

    #[test]
    fn test_identity_serializes_as_plain_string() {
        let id = Identity::new("x509::CN=alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"x509::CN=alice\"");
        let back: Identity = serde_json::from_str("\"x509::CN=alice\"").unwrap();
        assert_eq!(back, id);
    }
}
