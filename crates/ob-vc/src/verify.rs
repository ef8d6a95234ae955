//! # Proof Verification
//!
//! The verifier is strict about *shape* and lenient about *outcome*:
//! malformed proofs, unknown suites, bad encodings and unusable keys are
//! errors, while a well-formed signature that does not match returns
//! `valid = false`.
//!
//! Order of checks:
//!
//! 1. `type` and `verificationMethod` present.
//! 2. Suite supported, decided on `type` alone before any canonicalization
//!    work.
//! 3. Signature material decoded for the suite.
//! 4. Key type compatible with the suite / JWS `alg`.
//! 5. Signature checked over the proof-less canonical document, or over the
//!    `eddsa-jcs-2022` hash pair when the proof names that cryptosuite.
//!
//! Keys are supplied by the caller. There is no DID or JWKS resolution.

use ob_crypto::{decode_base58btc, CryptoError, DetachedJws, JwsAlgorithm, PublicKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credential::Credential;
use crate::error::ProofError;
use crate::proof::{Proof, ProofSuite, ProofSummary};

/// Outcome of checking one proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofVerification {
    /// Whether the signature matched.
    pub valid: bool,
    /// The resolved suite.
    pub suite: ProofSuite,
    /// Proof metadata.
    pub summary: ProofSummary,
}

/// Verify `proof` over `credential` with a caller-supplied key.
///
/// The credential may or may not still carry the proof; it is stripped
/// before canonicalization either way.
pub fn verify_proof(
    credential: &Credential,
    proof: &Proof,
    key: &PublicKey,
) -> Result<ProofVerification, ProofError> {
    let suite = proof.suite()?;

    let valid = match suite {
        ProofSuite::Ed25519Signature2020 | ProofSuite::DataIntegrityProof => {
            verify_multibase(credential, proof, suite, key)?
        }
        ProofSuite::JsonWebSignature2020 => verify_jws(credential, proof, key)?,
    };

    tracing::debug!(
        suite = %suite,
        verification_method = %proof.verification_method,
        key_type = key.key_type(),
        valid,
        "proof checked"
    );

    Ok(ProofVerification {
        valid,
        suite,
        summary: proof.summary(),
    })
}

fn verify_multibase(
    credential: &Credential,
    proof: &Proof,
    suite: ProofSuite,
    key: &PublicKey,
) -> Result<bool, ProofError> {
    let proof_value = proof
        .proof_value
        .as_deref()
        .ok_or_else(|| ProofError::InvalidProofStructure(format!("{suite} requires proofValue")))?;
    let signature = decode_base58btc(proof_value)
        .map_err(|e| ProofError::InvalidProofValueEncoding(e.to_string()))?;
    if signature.len() != 64 {
        return Err(ProofError::InvalidProofValueEncoding(format!(
            "expected a 64-byte Ed25519 signature, got {} bytes",
            signature.len()
        )));
    }

    if !matches!(key, PublicKey::Ed25519(_)) {
        return Err(ProofError::KeyAlgorithmMismatch {
            expected: "Ed25519".into(),
            actual: key.key_type().into(),
        });
    }

    if proof.is_eddsa_jcs_2022() {
        let input = proof.data_integrity_input(credential)?;
        return key.verify(input.as_bytes(), &signature).map_err(map_crypto_error);
    }
    let canonical = credential.signing_input()?;
    key.verify(canonical.as_bytes(), &signature)
        .map_err(map_crypto_error)
}

fn verify_jws(credential: &Credential, proof: &Proof, key: &PublicKey) -> Result<bool, ProofError> {
    let value = proof.jws_value().ok_or_else(|| {
        ProofError::InvalidProofStructure("JsonWebSignature2020 requires jws or proofValue".into())
    })?;
    let jws = DetachedJws::parse(value).map_err(|e| ProofError::InvalidJwsFormat(e.to_string()))?;

    let alg = jws.algorithm().map_err(|e| match e {
        CryptoError::UnsupportedAlgorithm(alg) => {
            ProofError::UnsupportedProofType(format!("JsonWebSignature2020 with alg {alg}"))
        }
        other => ProofError::InvalidJwsFormat(other.to_string()),
    })?;
    if alg != key.algorithm() {
        return Err(ProofError::KeyAlgorithmMismatch {
            expected: alg.to_string(),
            actual: key.key_type().into(),
        });
    }
    let expected_len = match alg {
        JwsAlgorithm::EdDSA | JwsAlgorithm::ES256 => 64,
    };
    if jws.signature().len() != expected_len {
        return Err(ProofError::InvalidJwsFormat(format!(
            "{alg} signature must be {expected_len} bytes, got {}",
            jws.signature().len()
        )));
    }

    let canonical = credential.signing_input()?;
    let input = jws.signing_input(&canonical);
    key.verify(input.as_bytes(), jws.signature())
        .map_err(map_crypto_error)
}

fn map_crypto_error(e: CryptoError) -> ProofError {
    match e {
        CryptoError::InvalidSignatureLength { .. } | CryptoError::Multibase(_) => {
            ProofError::InvalidProofValueEncoding(e.to_string())
        }
        other => ProofError::InvalidPublicKey(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Verification request contract
// ---------------------------------------------------------------------------

/// Message reported for an unsigned credential.
pub const NO_PROOF_MESSAGE: &str = "credential has no proof";

/// `{credential, publicKeyPem}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// The credential document.
    pub credential: Value,
    /// SPKI PEM of the issuer key.
    #[serde(default)]
    pub public_key_pem: Option<String>,
}

/// `{valid, proof?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VerifyResponse {
    /// Overall verdict.
    pub valid: bool,
    /// Metadata of the checked proof.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofSummary>,
    /// Why `valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyResponse {
    /// A negative verdict with a reason.
    pub fn invalid(proof: Option<ProofSummary>, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            proof,
            error: Some(error.into()),
        }
    }
}

/// Run the verification contract over a request.
///
/// Revocation is not checked here; callers holding a status store layer it
/// on top of a `valid` response.
pub fn verify_request(request: &VerifyRequest) -> Result<VerifyResponse, ProofError> {
    let pem = request
        .public_key_pem
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ProofError::PublicKeyRequired)?;
    let key = PublicKey::from_pem(pem).map_err(|e| ProofError::InvalidPublicKey(e.to_string()))?;

    let credential = Credential::from_value(request.credential.clone())
        .map_err(|e| ProofError::InvalidProofStructure(e.to_string()))?;

    let Some(proof) = credential.proof()? else {
        return Ok(VerifyResponse::invalid(None, NO_PROOF_MESSAGE));
    };

    let outcome = verify_proof(&credential, &proof, &key)?;
    if outcome.valid {
        Ok(VerifyResponse {
            valid: true,
            proof: Some(outcome.summary),
            error: None,
        })
    } else {
        Ok(VerifyResponse::invalid(
            Some(outcome.summary),
            "signature verification failed",
        ))
    }
}
