//! # Canonical Serialization: JCS-Compatible Signing Input
//!
//! This module defines [`CanonicalBytes`], the sole construction path for
//! bytes that get signed or verified anywhere in the engine.
//!
//! ## Invariant
//!
//! The inner buffer is private. The only constructors are
//! [`CanonicalBytes::new()`] and [`CanonicalBytes::for_signing()`], both of
//! which serialize through `serde_jcs` (RFC 8785): object keys sorted at every
//! depth, array order preserved, compact separators, ECMAScript number
//! formatting. Two semantically equal documents therefore always produce the
//! same bytes, regardless of the key order they arrived in.
//!
//! `for_signing()` additionally removes the top-level `proof` member, so a
//! signer (who has no proof yet) and a verifier (who does) canonicalize the
//! same body.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// The buffer is always valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Canonicalize any serializable value as-is.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Ok(Self(serde_jcs::to_string(&value)?))
    }

    /// Canonicalize a credential document for signing or verification.
    ///
    /// Works on a clone: the caller's document is untouched. The top-level
    /// `proof` member is removed before serialization; nested members named
    /// `proof` are part of the signed body and are kept.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::NotAnObject` if `doc` is not a JSON
    /// object.
    pub fn for_signing(doc: &Value) -> Result<Self, CanonicalizationError> {
        let mut body = match doc {
            Value::Object(map) => map.clone(),
            other => return Err(CanonicalizationError::NotAnObject(json_kind(other))),
        };
        body.remove("proof");
        Ok(Self(serde_jcs::to_string(&Value::Object(body))?))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Access the canonical form as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the canonical string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for CanonicalBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a credential document with its proof removed.
///
/// Convenience wrapper over [`CanonicalBytes::for_signing()`] returning the
/// canonical JSON string.
pub fn canonicalize(doc: &Value) -> Result<String, CanonicalizationError> {
    CanonicalBytes::for_signing(doc).map(CanonicalBytes::into_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
