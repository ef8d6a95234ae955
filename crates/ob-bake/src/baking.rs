//! # Baking Facade
//!
//! Chooses a codec (explicit format, else detection), moves the credential
//! in and out as compact JSON, and turns raw payload text back into a
//! [`Credential`].
//!
//! An unsupported format is always an error. Handing back the input bytes
//! unchanged would look like a successful bake.

use ob_vc::Credential;
use serde::{Deserialize, Serialize};

use crate::detect::{detect, ImageFormat};
use crate::error::BakeError;
use crate::{png, svg};

/// Options for [`bake`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeOptions {
    /// Skip detection and use this codec.
    #[serde(default)]
    pub format: Option<ImageFormat>,
}

/// Options for [`unbake`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbakeOptions {
    /// Skip detection and use this codec.
    #[serde(default)]
    pub format: Option<ImageFormat>,
}

/// A baked image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedImage {
    data: Vec<u8>,
    format: ImageFormat,
}

impl BakedImage {
    /// Image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume into the image bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Container format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// `image/png` or `image/svg+xml`.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// What [`unbake`] found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnbakeResult {
    /// Whether the image carried a payload.
    pub found: bool,
    /// The embedded credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
    /// OB2 hosted assertion URL, when the payload is a reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_url: Option<String>,
    /// Codec used.
    pub source_format: ImageFormat,
    /// Payload text exactly as embedded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

impl UnbakeResult {
    fn not_found(source_format: ImageFormat) -> Self {
        Self {
            found: false,
            credential: None,
            hosted_url: None,
            source_format,
            raw_data: None,
        }
    }
}

fn resolve_format(bytes: &[u8], explicit: Option<ImageFormat>) -> Result<ImageFormat, BakeError> {
    explicit
        .or_else(|| detect(bytes))
        .ok_or(BakeError::UnsupportedImageFormat)
}

/// Embed `credential` in `image`.
///
/// # Errors
///
/// - [`BakeError::UnsupportedImageFormat`] if no codec applies.
/// - Codec errors for a malformed PNG or SVG. The input is never partially
///   modified: validation completes before anything is written.
pub fn bake(image: &[u8], credential: &Credential, options: &BakeOptions) -> Result<BakedImage, BakeError> {
    let format = resolve_format(image, options.format)?;
    let payload = credential.to_json_string()?;
    let data = match format {
        ImageFormat::Png => png::bake(image, &payload)?,
        ImageFormat::Svg => svg::bake(image, &payload)?,
    };
    tracing::debug!(
        format = %format,
        version = credential.version().map(|v| v.as_str()).unwrap_or("unknown"),
        input_bytes = image.len(),
        output_bytes = data.len(),
        "credential baked"
    );
    Ok(BakedImage { data, format })
}

/// Extract the credential from `image`.
///
/// `found = false` when the image simply has no payload.
///
/// # Errors
///
/// - [`BakeError::UnsupportedImageFormat`] if no codec applies.
/// - [`BakeError::InvalidCredentialPayload`] if a payload exists but is not
///   a JSON object or a hosted assertion URL.
pub fn unbake(image: &[u8], options: &UnbakeOptions) -> Result<UnbakeResult, BakeError> {
    let format = resolve_format(image, options.format)?;
    let raw = match format {
        ImageFormat::Png => png::extract(image)?,
        ImageFormat::Svg => match svg::extract(image)? {
            None => None,
            Some(svg::SvgPayload::Embedded(text)) => Some(text),
            Some(svg::SvgPayload::HostedUrl(url)) => {
                return Ok(UnbakeResult {
                    found: true,
                    credential: None,
                    hosted_url: Some(url.clone()),
                    source_format: format,
                    raw_data: Some(url),
                })
            }
        },
    };

    let Some(raw) = raw else {
        tracing::debug!(format = %format, "no embedded credential");
        return Ok(UnbakeResult::not_found(format));
    };

    let trimmed = raw.trim();
    if is_hosted_url(trimmed) {
        return Ok(UnbakeResult {
            found: true,
            credential: None,
            hosted_url: Some(trimmed.to_string()),
            source_format: format,
            raw_data: Some(raw),
        });
    }

    let credential = Credential::from_json_str(trimmed)
        .map_err(|e| BakeError::InvalidCredentialPayload(e.to_string()))?;
    Ok(UnbakeResult {
        found: true,
        credential: Some(credential),
        hosted_url: None,
        source_format: format,
        raw_data: Some(raw),
    })
}

/// Whether `image` carries a readable payload. Unsupported or malformed
/// input is simply not baked.
pub fn is_baked(image: &[u8]) -> bool {
    matches!(unbake(image, &UnbakeOptions::default()), Ok(result) if result.found)
}

fn is_hosted_url(s: &str) -> bool {
    (s.starts_with("https://") || s.starts_with("http://")) && !s.contains(char::is_whitespace)
}
