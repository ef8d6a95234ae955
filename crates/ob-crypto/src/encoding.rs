//! # Multibase Encoding
//!
//! Proof values of `Ed25519Signature2020` and `DataIntegrityProof` are
//! multibase strings with the `z` (base58btc) prefix. Bitstring status lists
//! use the `u` (base64url, no padding) prefix. Any other base is rejected at
//! the call site that expects a specific one.

use multibase::Base;

use crate::error::CryptoError;

/// Multicodec prefix for an Ed25519 public key (`0xed` varint).
pub const ED25519_PUB_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Encode bytes as `z`-prefixed base58btc.
pub fn encode_base58btc(bytes: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, bytes)
}

/// Decode a `z`-prefixed base58btc string.
///
/// # Errors
///
/// Returns `CryptoError::Multibase` if the string is empty, malformed, or
/// uses any base other than base58btc.
pub fn decode_base58btc(s: &str) -> Result<Vec<u8>, CryptoError> {
    decode_expecting(s, Base::Base58Btc)
}

/// Encode bytes as `u`-prefixed base64url without padding.
pub fn encode_base64url(bytes: &[u8]) -> String {
    multibase::encode(Base::Base64Url, bytes)
}

/// Decode a `u`-prefixed base64url string.
pub fn decode_base64url(s: &str) -> Result<Vec<u8>, CryptoError> {
    decode_expecting(s, Base::Base64Url)
}

fn decode_expecting(s: &str, expected: Base) -> Result<Vec<u8>, CryptoError> {
    let expected_code = expected.code();
    if !s.starts_with(expected_code) {
        return Err(CryptoError::Multibase(format!(
            "expected '{expected_code}' prefix, got {:?}",
            s.chars().next()
        )));
    }
    let (base, bytes) = multibase::decode(s).map_err(|e| CryptoError::Multibase(e.to_string()))?;
    if base != expected {
        return Err(CryptoError::Multibase(format!("unexpected base {base:?}")));
    }
    Ok(bytes)
}
