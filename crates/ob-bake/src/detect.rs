//! # Format Detection
//!
//! Magic-byte sniffing. PNG is recognized by its 8-byte signature at offset
//! 0. SVG has no signature, so the first [`SVG_SNIFF_LIMIT`] bytes are
//! searched for an XML declaration, an SVG doctype or an `<svg` tag. An SVG
//! whose marker only appears later (a long leading comment, say) is reported
//! as unknown; pass the format explicitly for those.

use serde::{Deserialize, Serialize};

use crate::png::PNG_SIGNATURE;

/// How far into the buffer SVG markers are searched for.
pub const SVG_SNIFF_LIMIT: usize = 1000;

const SVG_MARKERS: [&[u8]; 3] = [b"<?xml", b"<!DOCTYPE svg", b"<svg"];

/// Image containers that can carry a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG, payload in an `iTXt` chunk.
    Png,
    /// SVG, payload in an `openbadges:credential` element.
    Svg,
}

impl ImageFormat {
    /// MIME type of baked output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Lowercase name, also the usual file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// Parse a name (`png`, `svg`) or MIME type, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "image/png" => Some(Self::Png),
            "svg" | "image/svg+xml" => Some(Self::Svg),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = crate::BakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(crate::BakeError::UnsupportedImageFormat)
    }
}

/// Sniff the container format of `bytes`.
pub fn detect(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        return Some(ImageFormat::Png);
    }
    let head = &bytes[..bytes.len().min(SVG_SNIFF_LIMIT)];
    if SVG_MARKERS.iter().any(|marker| contains(head, marker)) {
        return Some(ImageFormat::Svg);
    }
    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
