//! # ob-vc: Open Badges Credentials
//!
//! The credential document model and everything that reads or writes
//! proofs on it:
//!
//! - [`Credential`]: an OB2 assertion or OB3 credential, kept as its JSON
//!   object so canonicalization sees every member the issuer signed.
//! - [`serialize_credential`]: OB2 / OB3 wire shaping from raw records.
//! - [`sign_credential`]: Ed25519 proofs in all three supported suites.
//! - [`verify_proof`] and [`verify_request`]: multi-suite verification with
//!   caller-supplied keys.

pub mod credential;
pub mod error;
pub mod proof;
pub mod serializer;
pub mod sign;
pub mod verify;

pub use credential::{Credential, CredentialStatus};
pub use error::{CredentialError, ProofError};
pub use proof::{Proof, ProofPurpose, ProofSuite, ProofSummary, EDDSA_JCS_2022};
pub use serializer::{
    hash_identity, serialize_credential, AchievementRecord, AssertionRecord, IssuerRecord,
    RecipientRecord,
};
pub use sign::sign_credential;
pub use verify::{
    verify_proof, verify_request, ProofVerification, VerifyRequest, VerifyResponse,
    NO_PROOF_MESSAGE,
};
