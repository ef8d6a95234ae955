//! # ob-core: Foundational Types for the Open Badges Engine
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! primitives every other crate leans on:
//!
//! 1. **`CanonicalBytes` newtype.** All signing and verification input flows
//!    through [`CanonicalBytes::for_signing()`]. No raw `serde_json::to_vec()`
//!    on a credential body is ever signed or verified. This keeps the signer
//!    and the verifier byte-for-byte aligned by construction.
//!
//! 2. **Context constants.** The JSON-LD context URLs and type names for
//!    Open Badges 2.0 and 3.0 live in one place. The OB3 `@context` ordering
//!    (VC 2.0 first, OB 3.0 second) is a wire contract, exposed as
//!    [`OB3_CONTEXTS`] rather than rebuilt ad hoc.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] renders `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ob-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod context;
pub mod error;
pub mod temporal;

pub use canonical::{canonicalize, CanonicalBytes};
pub use context::{
    OpenBadgesVersion, OB2_CONTEXT, OB3_CONTEXT, OB3_CONTEXTS, OB3_CREDENTIAL_TYPES,
    OPENBADGES_NAMESPACE, VC_V2_CONTEXT,
};
pub use error::{CanonicalizationError, TimestampError};
pub use temporal::Timestamp;
