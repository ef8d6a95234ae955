//! # Proof Objects
//!
//! Three proof suites are supported:
//!
//! - **Ed25519Signature2020**: raw Ed25519 signature, `z`-multibase in
//!   `proofValue`.
//! - **DataIntegrityProof**: `z`-multibase `proofValue`. With
//!   `cryptosuite: eddsa-jcs-2022` the signature covers the hash pair of the
//!   proof configuration and the document; otherwise it covers the canonical
//!   document like `Ed25519Signature2020`.
//! - **JsonWebSignature2020**: detached JWS in `jws` (or `proofValue`),
//!   `EdDSA` or `ES256`.
//!
//! [`Proof`] keeps `type` as the raw wire string. The suite is resolved by
//! [`Proof::suite`] during verification so an unknown suite surfaces as
//! `UnsupportedProofType` rather than a deserialization failure.

use ob_core::CanonicalBytes;
use ob_crypto::DataIntegritySigningInput;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credential::Credential;
use crate::error::ProofError;

/// `cryptosuite` value written by the signer for `DataIntegrityProof`.
pub const EDDSA_JCS_2022: &str = "eddsa-jcs-2022";

/// The supported proof suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofSuite {
    /// Ed25519 signature, multibase `proofValue`.
    Ed25519Signature2020,
    /// W3C Data Integrity proof with an EdDSA cryptosuite.
    DataIntegrityProof,
    /// Detached JWS.
    JsonWebSignature2020,
}

impl ProofSuite {
    /// Resolve a proof `type` string.
    pub fn parse(proof_type: &str) -> Option<Self> {
        match proof_type {
            "Ed25519Signature2020" => Some(Self::Ed25519Signature2020),
            "DataIntegrityProof" => Some(Self::DataIntegrityProof),
            "JsonWebSignature2020" => Some(Self::JsonWebSignature2020),
            _ => None,
        }
    }

    /// The wire `type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519Signature2020 => "Ed25519Signature2020",
            Self::DataIntegrityProof => "DataIntegrityProof",
            Self::JsonWebSignature2020 => "JsonWebSignature2020",
        }
    }
}

impl std::fmt::Display for ProofSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The purpose of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// The issuer asserts the credential claims.
    AssertionMethod,
    /// Authentication of the holder.
    Authentication,
}

impl ProofPurpose {
    /// The wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssertionMethod => "assertionMethod",
            Self::Authentication => "authentication",
        }
    }
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proof object as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Suite name.
    #[serde(rename = "type")]
    pub proof_type: String,

    /// `DataIntegrityProof` cryptosuite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    /// Creation time, as written by the signer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Key reference (DID URL or key URL).
    pub verification_method: String,

    /// Usually `assertionMethod`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    /// Multibase signature, or a detached JWS for `JsonWebSignature2020`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    /// Detached JWS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,

    /// Other proof options (`id`, `expires`, `domain`, `challenge`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Proof {
    /// Parse a proof object, requiring `type` and `verificationMethod`.
    pub fn from_value(value: &Value) -> Result<Self, ProofError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ProofError::InvalidProofStructure("proof must be an object".into()))?;
        for required in ["type", "verificationMethod"] {
            match obj.get(required) {
                Some(Value::String(s)) if !s.is_empty() => {}
                _ => {
                    return Err(ProofError::InvalidProofStructure(format!(
                        "missing {required}"
                    )))
                }
            }
        }
        serde_json::from_value(value.clone())
            .map_err(|e| ProofError::InvalidProofStructure(e.to_string()))
    }

    /// Resolve the suite.
    pub fn suite(&self) -> Result<ProofSuite, ProofError> {
        ProofSuite::parse(&self.proof_type)
            .ok_or_else(|| ProofError::UnsupportedProofType(self.proof_type.clone()))
    }

    /// The JWS for a `JsonWebSignature2020` proof: `jws`, else `proofValue`.
    pub fn jws_value(&self) -> Option<&str> {
        self.jws.as_deref().or(self.proof_value.as_deref())
    }

    /// Serialize to a JSON object.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// `true` for a `DataIntegrityProof` using `eddsa-jcs-2022`.
    pub fn is_eddsa_jcs_2022(&self) -> bool {
        self.proof_type == ProofSuite::DataIntegrityProof.as_str() && self.cryptosuite.as_deref() == Some(EDDSA_JCS_2022)
    }

    /// The `eddsa-jcs-2022` signing input for this proof over `credential`.
    ///
    /// The proof configuration is this proof without `proofValue`, carrying
    /// the credential's `@context`.
    pub fn data_integrity_input(&self, credential: &Credential) -> Result<DataIntegritySigningInput, ProofError> {
        let mut config = self.clone();
        config.proof_value = None;
        let mut config = match serde_json::to_value(&config) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(ProofError::InvalidProofStructure("proof must be an object".into())),
            Err(e) => return Err(ProofError::InvalidProofStructure(e.to_string())),
        };
        if let Some(context) = credential.as_map().get("@context") {
            config.insert("@context".into(), context.clone());
        }
        let config = CanonicalBytes::new(&Value::Object(config))?;
        let document = credential.signing_input()?;
        Ok(DataIntegritySigningInput::new(&config, &document))
    }

    /// The public fields reported in verification responses.
    pub fn summary(&self) -> ProofSummary {
        ProofSummary {
            proof_type: self.proof_type.clone(),
            verification_method: self.verification_method.clone(),
            created: self.created.clone(),
            proof_purpose: self.proof_purpose.clone(),
        }
    }
}

/// Proof metadata echoed back to verification callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSummary {
    /// Suite name.
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Key reference.
    pub verification_method: String,
    /// Creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Proof purpose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,
}
