//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from ob-vc, ob-bake and ob-status to HTTP status codes
//! with a JSON body carrying a machine-readable code and a message.
//! Internal error details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ob_bake::BakeError;
use ob_status::StatusError;
use ob_vc::ProofError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error code and message.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body could not be parsed or is missing required input (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request is well-formed but its content is unusable (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Image is neither PNG nor SVG (415).
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::UnsupportedMediaType(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Every proof error is a problem with the request: a forged signature is
/// not an error at all and never reaches this conversion.
impl From<ProofError> for AppError {
    fn from(err: ProofError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<BakeError> for AppError {
    fn from(err: BakeError) -> Self {
        match &err {
            BakeError::UnsupportedImageFormat => Self::UnsupportedMediaType(err.to_string()),
            BakeError::Serialization(_) => Self::Internal(err.to_string()),
            BakeError::InvalidPngSignature
            | BakeError::MalformedPng(_)
            | BakeError::InvalidSvgContent(_)
            | BakeError::NoSvgRootElement
            | BakeError::InvalidCredentialPayload(_) => Self::Validation(err.to_string()),
        }
    }
}

impl From<StatusError> for AppError {
    fn from(err: StatusError) -> Self {
        match &err {
            StatusError::NotFound(_) => Self::NotFound(err.to_string()),
            StatusError::Conflict { .. } | StatusError::ListFull { .. } => Self::Conflict(err.to_string()),
            StatusError::InvalidStatus { .. } => Self::Validation(err.to_string()),
            StatusError::Store(_) | StatusError::Encoding(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use uuid::Uuid;

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            (
                AppError::UnsupportedMediaType("x".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
            ),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn domain_error_mapping() {
        assert!(matches!(AppError::from(ProofError::PublicKeyRequired), AppError::BadRequest(_)));
        assert!(matches!(
            AppError::from(BakeError::UnsupportedImageFormat),
            AppError::UnsupportedMediaType(_)
        ));
        assert!(matches!(AppError::from(BakeError::NoSvgRootElement), AppError::Validation(_)));
        assert!(matches!(
            AppError::from(StatusError::ListFull { list_id: Uuid::nil() }),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(StatusError::Store("down".into())),
            AppError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn internal_message_is_hidden() {
        let response = AppError::Internal("password=hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("hunter2"));
    }
}
