//! # ECDSA P-256 Verification
//!
//! Verification-only support for `ES256` detached JWS proofs. The signature
//! is the fixed-width `r || s` form (64 bytes), not DER.

use p256::ecdsa::signature::Verifier;
use p256::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};

use crate::error::CryptoError;

/// A P-256 public key.
#[derive(Clone, PartialEq, Eq)]
pub struct P256PublicKey(p256::ecdsa::VerifyingKey);

impl P256PublicKey {
    /// Parse an SPKI PEM P-256 key.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        p256::ecdsa::VerifyingKey::from_public_key_pem(pem.trim())
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(format!("P-256 PEM: {e}")))
    }

    /// Parse a SEC1-encoded point (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        p256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(format!("P-256 point: {e}")))
    }

    /// Render as SPKI PEM.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// Uncompressed SEC1 encoding (65 bytes).
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Verify an `r || s` signature over `message` (SHA-256 prehash).
    ///
    /// A 64-byte signature whose scalars are out of range cannot match any
    /// message and yields `Ok(false)`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        if signature.len() != 64 {
            return Err(CryptoError::InvalidSignatureLength {
                algorithm: "ES256",
                expected: 64,
                actual: signature.len(),
            });
        }
        let Ok(sig) = p256::ecdsa::Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(self.0.verify(message, &sig).is_ok())
    }
}

impl From<p256::ecdsa::VerifyingKey> for P256PublicKey {
    fn from(vk: p256::ecdsa::VerifyingKey) -> Self {
        Self(vk)
    }
}

impl std::fmt::Debug for P256PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sec1 = self.to_sec1_bytes();
        let prefix: String = sec1.iter().skip(1).take(4).map(|b| format!("{b:02x}")).collect();
        write!(f, "P256PublicKey({prefix}...)")
    }
}
