//! # Custom Extractors & Validation
//!
//! The [`Validate`] trait for request DTOs and helpers that turn JSON
//! rejections and failed validation into [`AppError`]s.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::AppError;

/// Business rules beyond what serde deserialization checks.
pub trait Validate {
    /// `Err` carries the message returned as [`AppError::BadRequest`].
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::BadRequest)?;
    Ok(value)
}

/// Decode a standard base64 image field.
pub fn decode_image(field: &str) -> Result<Vec<u8>, AppError> {
    STANDARD
        .decode(field.trim())
        .map_err(|e| AppError::BadRequest(format!("image is not valid base64: {e}")))
}
