//! # Credential Document
//!
//! [`Credential`] wraps the credential's JSON object instead of mapping it
//! onto a fixed struct. Open Badges documents carry issuer-defined
//! extensions, and a verifier that dropped an unknown member while
//! re-serializing would canonicalize different bytes from the ones the
//! issuer signed.

use ob_core::{CanonicalBytes, CanonicalizationError, OpenBadgesVersion};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CredentialError;
use crate::proof::Proof;

/// An Open Badges 2.0 assertion or Open Badges 3.0 credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(Map<String, Value>);

/// The `credentialStatus` member of an OB3 credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    /// `{statusListCredential}#{statusListIndex}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Usually `BitstringStatusListEntry`.
    #[serde(rename = "type")]
    pub status_type: String,
    /// `revocation` or `suspension`.
    pub status_purpose: String,
    /// Index into the list, as a decimal string.
    pub status_list_index: String,
    /// URL of the status list credential.
    pub status_list_credential: String,
}

impl CredentialStatus {
    /// Parse `statusListIndex` as a number.
    pub fn index(&self) -> Option<u64> {
        self.status_list_index.parse().ok()
    }
}

impl Credential {
    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, CredentialError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(CredentialError::NotAnObject),
        }
    }

    /// Wrap an object map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parse a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, CredentialError> {
        Self::from_value(serde_json::from_str(s)?)
    }

    /// Borrow the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutable access to the underlying object.
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Clone into a `serde_json::Value`.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Consume into a `serde_json::Value`.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// OB2 or OB3, inferred from `type`.
    pub fn version(&self) -> Option<OpenBadgesVersion> {
        OpenBadgesVersion::detect(&Value::Object(self.0.clone()))
    }

    /// The credential `id`, if present.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The raw `proof` member.
    pub fn proof_value(&self) -> Option<&Value> {
        self.0.get("proof")
    }

    /// The single embedded proof, parsed.
    ///
    /// `Ok(None)` when the credential is unsigned (hosted). A `proof` array
    /// with exactly one element is accepted; anything else is malformed.
    pub fn proof(&self) -> Result<Option<Proof>, crate::ProofError> {
        match self.0.get("proof") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => match items.as_slice() {
                [] => Ok(None),
                [single] => Proof::from_value(single).map(Some),
                _ => Err(crate::ProofError::InvalidProofStructure(format!(
                    "expected at most one proof, found {}",
                    items.len()
                ))),
            },
            Some(value) => Proof::from_value(value).map(Some),
        }
    }

    /// Attach (or replace) the proof.
    pub fn set_proof(&mut self, proof: &Proof) {
        self.0.insert("proof".to_string(), proof.to_value());
    }

    /// Remove and return the raw proof.
    pub fn take_proof(&mut self) -> Option<Value> {
        self.0.remove("proof")
    }

    /// The `credentialStatus` member, if present and well-formed.
    pub fn credential_status(&self) -> Option<CredentialStatus> {
        self.0
            .get("credentialStatus")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Attach (or replace) `credentialStatus`.
    pub fn set_credential_status(&mut self, status: &CredentialStatus) -> Result<(), serde_json::Error> {
        self.0
            .insert("credentialStatus".to_string(), serde_json::to_value(status)?);
        Ok(())
    }

    /// Canonical bytes of the document with the top-level `proof` removed.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::for_signing(&Value::Object(self.0.clone()))
    }
}

impl TryFrom<Value> for Credential {
    type Error = CredentialError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Credential> for Value {
    fn from(credential: Credential) -> Self {
        credential.into_value()
    }
}
