//! Errors for credential handling and proof verification.
//!
//! A signature that does not match is never one of these: verification
//! returns `valid = false` for that case so a forged credential cannot be
//! mistaken for a transport failure and "fail open".

use thiserror::Error;

/// Errors from proof verification and signing.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The proof (or the credential carrying it) is missing required members.
    #[error("invalid proof structure: {0}")]
    InvalidProofStructure(String),

    /// The proof `type` is not one of the supported suites.
    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),

    /// `proofValue` is not valid multibase, or decodes to the wrong length.
    #[error("invalid proof value encoding: {0}")]
    InvalidProofValueEncoding(String),

    /// The JWS is not in detached `header..signature` form.
    #[error("invalid JWS format: {0}")]
    InvalidJwsFormat(String),

    /// No public key was supplied with the verification request.
    #[error("a public key is required to verify this credential")]
    PublicKeyRequired,

    /// The supplied public key could not be parsed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The key type cannot verify this proof's algorithm.
    #[error("key algorithm mismatch: proof requires {expected}, key is {actual}")]
    KeyAlgorithmMismatch {
        /// Algorithm the proof was made with.
        expected: String,
        /// Type of the supplied key.
        actual: String,
    },

    /// The credential body could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] ob_core::CanonicalizationError),
}

/// Errors from building a [`Credential`](crate::Credential) out of JSON.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The document is not a JSON object.
    #[error("credential must be a JSON object")]
    NotAnObject,

    /// The document is not valid JSON.
    #[error("credential is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
