//! # JSON-LD Contexts and Credential Types
//!
//! Wire constants for Open Badges 2.0 assertions and Open Badges 3.0
//! verifiable credentials.
//!
//! ## Invariant
//!
//! An OB3 credential's `@context` array starts with [`VC_V2_CONTEXT`]
//! followed by [`OB3_CONTEXT`]. JSON-LD processors resolve terms in context
//! order, so swapping the two changes the meaning of the document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// W3C Verifiable Credentials Data Model 2.0 context.
pub const VC_V2_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";

/// Open Badges 3.0 context.
pub const OB3_CONTEXT: &str = "https://purl.imsglobal.org/spec/ob/v3p0/context-3.0.3.json";

/// Open Badges 2.0 context (single string).
pub const OB2_CONTEXT: &str = "https://w3id.org/openbadges/v2";

/// The ordered `@context` array of every OB3 credential.
pub const OB3_CONTEXTS: [&str; 2] = [VC_V2_CONTEXT, OB3_CONTEXT];

/// The leading `type` entries of every OB3 credential.
pub const OB3_CREDENTIAL_TYPES: [&str; 2] = ["VerifiableCredential", "OpenBadgeCredential"];

/// XML namespace bound to the `openbadges` prefix in baked SVGs.
pub const OPENBADGES_NAMESPACE: &str = "https://purl.imsglobal.org/spec/ob/v3p0";

/// The Open Badges wire version of a credential document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenBadgesVersion {
    /// Open Badges 2.0 `Assertion`.
    #[serde(rename = "2.0")]
    V2,
    /// Open Badges 3.0 `OpenBadgeCredential`.
    #[serde(rename = "3.0")]
    V3,
}

impl OpenBadgesVersion {
    /// Infer the version from a document's `type` member.
    ///
    /// `"Assertion"` (string or array member) is OB2; an array containing
    /// `"VerifiableCredential"` is OB3. Anything else is unrecognized.
    pub fn detect(doc: &Value) -> Option<Self> {
        match doc.get("type")? {
            Value::String(t) if t == "Assertion" => Some(Self::V2),
            Value::Array(types) => {
                let has = |name: &str| types.iter().any(|t| t.as_str() == Some(name));
                if has("VerifiableCredential") {
                    Some(Self::V3)
                } else if has("Assertion") {
                    Some(Self::V2)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// The short label used in logs and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "2.0",
            Self::V3 => "3.0",
        }
    }
}

impl std::fmt::Display for OpenBadgesVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
