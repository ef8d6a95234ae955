//! # Proof Signing
//!
//! Issuance-side counterpart to [`verify_proof`](crate::verify_proof). The
//! signature always covers the credential with its top-level `proof`
//! removed, so signing an already-signed credential replaces the old proof.
//! `DataIntegrityProof` proofs are written as `eddsa-jcs-2022`.

use ob_core::Timestamp;
use ob_crypto::{DetachedJws, Ed25519KeyPair, JwsAlgorithm, JwsHeader, JwsSigningInput};

use crate::credential::Credential;
use crate::error::ProofError;
use crate::proof::{Proof, ProofPurpose, ProofSuite, EDDSA_JCS_2022};

/// Sign `credential` with an Ed25519 key under the given suite.
///
/// Returns a copy carrying the new proof. `JsonWebSignature2020` proofs are
/// written as an `EdDSA` detached JWS in the `jws` member.
pub fn sign_credential(
    credential: &Credential,
    key_pair: &Ed25519KeyPair,
    verification_method: &str,
    suite: ProofSuite,
    created: Timestamp,
) -> Result<Credential, ProofError> {
    let mut signed = credential.clone();
    signed.take_proof();
    let canonical = signed.signing_input()?;

    let mut proof = Proof {
        proof_type: suite.as_str().to_string(),
        cryptosuite: None,
        created: Some(created.to_iso8601()),
        verification_method: verification_method.to_string(),
        proof_purpose: Some(ProofPurpose::AssertionMethod.as_str().to_string()),
        proof_value: None,
        jws: None,
        extra: Default::default(),
    };

    match suite {
        ProofSuite::Ed25519Signature2020 => {
            proof.proof_value = Some(key_pair.sign(&canonical).to_multibase());
        }
        ProofSuite::DataIntegrityProof => {
            proof.cryptosuite = Some(EDDSA_JCS_2022.to_string());
            let input = proof.data_integrity_input(&signed)?;
            proof.proof_value = Some(key_pair.sign_data_integrity(&input).to_multibase());
        }
        ProofSuite::JsonWebSignature2020 => {
            let header = JwsHeader::detached(JwsAlgorithm::EdDSA)
                .encode()
                .map_err(|e| ProofError::InvalidJwsFormat(e.to_string()))?;
            let input = JwsSigningInput::new(&header, &canonical);
            let signature = key_pair.sign_jws(&input);
            proof.jws = Some(DetachedJws::compose(&header, signature.as_bytes()));
        }
    }

    tracing::debug!(
        suite = %suite,
        verification_method,
        credential_id = signed.id().unwrap_or("<none>"),
        "credential signed"
    );

    signed.set_proof(&proof);
    Ok(signed)
}
