//! # Bearer Token Authentication
//!
//! Guards the routes that change status state: attaching a
//! `credentialStatus` at issuance and revoking. Verification, baking and
//! status list publication stay public, since relying parties must reach
//! them without credentials.
//!
//! ```text
//! Authorization: Bearer {AUTH_TOKEN}
//! ```
//!
//! Without a configured token the guarded routes reject every request.

use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Expected bearer token, injected into request extensions.
///
/// `Debug` redacts the token.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time token comparison. A length mismatch still performs a
/// comparison of equal cost.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Validate the `Authorization` header against `expected`.
fn check_bearer(headers: &HeaderMap, expected: &str) -> Result<(), &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or("missing authorization header")?;
    let provided = value
        .strip_prefix("Bearer ")
        .ok_or("authorization header must use Bearer scheme")?;
    if constant_time_token_eq(provided.trim(), expected) {
        Ok(())
    } else {
        Err("invalid bearer token")
    }
}

/// Check `Authorization: Bearer ...` against the configured token.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let Some(expected) = expected else {
        tracing::warn!(path = %request.uri().path(), "rejected: no AUTH_TOKEN configured");
        return AppError::Unauthorized("authentication is not configured".into()).into_response();
    };

    match check_bearer(request.headers(), &expected) {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            tracing::warn!(%reason, path = %request.uri().path(), "authentication failed");
            AppError::Unauthorized(reason.into()).into_response()
        }
    }
}
