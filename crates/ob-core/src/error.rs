//! # Error Types
//!
//! Leaf-level errors shared by the whole workspace. Every crate layers its
//! own `thiserror` enum on top and converts these with `#[from]`.

use thiserror::Error;

/// Error during canonical serialization of a credential document.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Signing input must be a JSON object (a credential document).
    #[error("canonicalization requires a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing a timestamp.
#[derive(Error, Debug)]
pub enum TimestampError {
    /// The string is not valid RFC 3339.
    #[error("invalid RFC 3339 timestamp {input:?}: {reason}")]
    Invalid {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// Seconds since epoch are out of the representable range.
    #[error("invalid unix timestamp: {0}")]
    OutOfRange(i64),
}
