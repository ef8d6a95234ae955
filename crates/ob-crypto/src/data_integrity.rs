//! # Data Integrity Hashing
//!
//! `eddsa-jcs-2022` does not sign the canonical document directly. The
//! signature covers `SHA-256(proofConfig) || SHA-256(document)`, each side
//! JCS-canonicalized first, 64 bytes in total.

use ob_core::CanonicalBytes;
use sha2::{Digest, Sha256};

/// The 64-byte hash pair an `eddsa-jcs-2022` signature covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIntegritySigningInput(Vec<u8>);

impl DataIntegritySigningInput {
    /// Hash the canonical proof configuration and the canonical document
    /// (proof removed), proof configuration first.
    pub fn new(proof_config: &CanonicalBytes, document: &CanonicalBytes) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&Sha256::digest(proof_config.as_bytes()));
        buf.extend_from_slice(&Sha256::digest(document.as_bytes()));
        Self(buf)
    }

    /// Access the hash pair.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
