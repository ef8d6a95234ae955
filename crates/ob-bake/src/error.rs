//! Baking errors.
//!
//! "Not found" is not an error: unbaking an image with no payload yields
//! `found = false`. A payload that is present but unreadable is
//! [`BakeError::InvalidCredentialPayload`], since that points at corruption
//! or tampering.

use thiserror::Error;

/// Errors from baking and unbaking.
#[derive(Error, Debug)]
pub enum BakeError {
    /// The first 8 bytes are not the PNG signature.
    #[error("invalid PNG signature")]
    InvalidPngSignature,

    /// Chunk structure is broken: truncation, CRC mismatch or missing `IEND`.
    #[error("malformed PNG: {0}")]
    MalformedPng(String),

    /// The SVG is not well-formed XML.
    #[error("invalid SVG content: {0}")]
    InvalidSvgContent(String),

    /// The document root is not `<svg>`.
    #[error("document root is not an <svg> element")]
    NoSvgRootElement,

    /// An embedded payload exists but is not a credential.
    #[error("invalid credential payload: {0}")]
    InvalidCredentialPayload(String),

    /// Neither an explicit format nor detection produced PNG or SVG.
    #[error("unsupported image format")]
    UnsupportedImageFormat,

    /// The credential could not be serialized for embedding.
    #[error("credential serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
