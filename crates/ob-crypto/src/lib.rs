//! # ob-crypto: Cryptographic Primitives for the Open Badges Engine
//!
//! - **Ed25519** (`ed25519-dalek`): key pairs rebuilt from seeds or PKCS#8,
//!   signing over [`ob_core::CanonicalBytes`], verification.
//! - **P-256** (`p256`): verification of `ES256` detached JWS signatures.
//! - **Multibase**: `z` base58btc proof values and `u` base64url bitstrings.
//! - **Detached JWS**: RFC 7797 unencoded-payload signing input.
//! - **Data Integrity**: the `eddsa-jcs-2022` hash-pair signing input.
//!
//! Verification returns `Ok(false)` for a signature that does not match and
//! reserves `Err` for malformed keys, signatures, and encodings.

pub mod data_integrity;
pub mod ecdsa;
pub mod ed25519;
pub mod encoding;
pub mod error;
pub mod jws;
pub mod public_key;

pub use data_integrity::DataIntegritySigningInput;
pub use ecdsa::P256PublicKey;
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use encoding::{decode_base58btc, decode_base64url, encode_base58btc, encode_base64url};
pub use error::CryptoError;
pub use jws::{DetachedJws, JwsAlgorithm, JwsHeader, JwsSigningInput};
pub use public_key::PublicKey;
