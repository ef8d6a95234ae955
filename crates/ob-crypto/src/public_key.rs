//! # Verification Keys
//!
//! The verifier is handed an SPKI PEM by its caller and does not know in
//! advance which curve it holds. [`PublicKey`] tries Ed25519 first, then
//! P-256, and carries the algorithm with it so a proof can be checked for a
//! key/algorithm mismatch before any signature math runs.

use crate::ecdsa::P256PublicKey;
use crate::ed25519::{Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;
use crate::jws::JwsAlgorithm;

/// A caller-supplied verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// Ed25519 key.
    Ed25519(Ed25519PublicKey),
    /// NIST P-256 key.
    P256(P256PublicKey),
}

impl PublicKey {
    /// Parse an SPKI PEM holding either an Ed25519 or a P-256 key.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        if let Ok(key) = Ed25519PublicKey::from_pem(pem) {
            return Ok(Self::Ed25519(key));
        }
        if let Ok(key) = P256PublicKey::from_pem(pem) {
            return Ok(Self::P256(key));
        }
        Err(CryptoError::InvalidPublicKey(
            "PEM is not an Ed25519 or P-256 SubjectPublicKeyInfo".into(),
        ))
    }

    /// Render as SPKI PEM.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        match self {
            Self::Ed25519(key) => key.to_pem(),
            Self::P256(key) => key.to_pem(),
        }
    }

    /// The JWS algorithm this key verifies.
    pub fn algorithm(&self) -> JwsAlgorithm {
        match self {
            Self::Ed25519(_) => JwsAlgorithm::EdDSA,
            Self::P256(_) => JwsAlgorithm::ES256,
        }
    }

    /// Short label for logs and error messages.
    pub fn key_type(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "Ed25519",
            Self::P256(_) => "P-256",
        }
    }

    /// Verify a raw signature over `message`.
    ///
    /// `Ok(false)` means the signature is well-formed but does not match.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        match self {
            Self::Ed25519(key) => key.verify(message, &Ed25519Signature::from_slice(signature)?),
            Self::P256(key) => key.verify(message, signature),
        }
    }
}

impl From<Ed25519PublicKey> for PublicKey {
    fn from(key: Ed25519PublicKey) -> Self {
        Self::Ed25519(key)
    }
}

impl From<P256PublicKey> for PublicKey {
    fn from(key: P256PublicKey) -> Self {
        Self::P256(key)
    }
}
