//! # Baking API
//!
//! Embeds credentials in badge images and extracts them again. Images
//! travel as standard base64 inside JSON.

use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ob_bake::{BakeOptions, ImageFormat, UnbakeOptions, UnbakeResult};
use ob_vc::Credential;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::extractors::{decode_image, extract_validated_json, Validate};
use crate::state::AppState;

/// `POST /v1/bake` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BakeRequest {
    /// Base64 PNG or SVG.
    pub image: String,
    /// Credential to embed, signed or not.
    pub credential: Value,
    /// Skip format detection.
    #[serde(default)]
    pub format: Option<ImageFormat>,
}

impl Validate for BakeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("image must not be empty".to_string());
        }
        if !self.credential.is_object() {
            return Err("credential must be a JSON object".to_string());
        }
        Ok(())
    }
}

/// `POST /v1/bake` response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BakeResponse {
    /// Base64 baked image.
    pub image: String,
    /// Format of the baked image.
    pub format: ImageFormat,
    /// `image/png` or `image/svg+xml`.
    pub mime_type: String,
    /// Decoded length in bytes.
    pub size: usize,
}

/// `POST /v1/unbake` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnbakeRequest {
    /// Base64 baked image.
    pub image: String,
    /// Skip format detection.
    #[serde(default)]
    pub format: Option<ImageFormat>,
}

impl Validate for UnbakeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("image must not be empty".to_string());
        }
        Ok(())
    }
}

/// Build the baking router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/bake", post(bake))
        .route("/v1/unbake", post(unbake))
}

/// POST /v1/bake: embed a credential in an image.
async fn bake(body: Result<Json<BakeRequest>, JsonRejection>) -> Result<Json<BakeResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let image = decode_image(&req.image)?;
    let credential = Credential::from_value(req.credential).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let baked = ob_bake::bake(&image, &credential, &BakeOptions { format: req.format })?;
    tracing::info!(format = %baked.format(), size = baked.size(), "image baked");

    Ok(Json(BakeResponse {
        image: STANDARD.encode(baked.data()),
        format: baked.format(),
        mime_type: baked.mime_type().to_string(),
        size: baked.size(),
    }))
}

/// POST /v1/unbake: extract the credential from an image.
async fn unbake(body: Result<Json<UnbakeRequest>, JsonRejection>) -> Result<Json<UnbakeResult>, AppError> {
    let req = extract_validated_json(body)?;
    let image = decode_image(&req.image)?;
    let result = ob_bake::unbake(&image, &UnbakeOptions { format: req.format })?;
    tracing::info!(format = %result.source_format, found = result.found, "image unbaked");
    Ok(Json(result))
}
