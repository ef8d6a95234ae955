//! # Cryptographic Error Types
//!
//! Structured errors for key parsing, encoding and signature checks.
//! A signature that simply does not match is *not* an error: verification
//! functions return `Ok(false)` for that case.

use thiserror::Error;

/// Errors from cryptographic operations in `ob-crypto`.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The public key could not be parsed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The private key could not be parsed.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// A signature has the wrong byte length for its algorithm.
    #[error("invalid {algorithm} signature length: expected {expected} bytes, got {actual}")]
    InvalidSignatureLength {
        /// Algorithm name.
        algorithm: &'static str,
        /// Expected length in bytes.
        expected: usize,
        /// Observed length in bytes.
        actual: usize,
    },

    /// Multibase decoding failed or used an unexpected base.
    #[error("multibase error: {0}")]
    Multibase(String),

    /// Detached JWS could not be parsed.
    #[error("malformed JWS: {0}")]
    Jws(String),

    /// The JWS `alg` header names an algorithm this engine does not verify.
    #[error("unsupported JWS algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key encoding (PEM export) failed.
    #[error("key encoding failed: {0}")]
    Encoding(String),
}
