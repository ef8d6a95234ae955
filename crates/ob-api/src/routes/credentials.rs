//! # Credential API
//!
//! Verification, status attachment at issuance, and revocation.
//!
//! Verification layers the status check on top of the proof check: a
//! credential whose proof verifies but whose `credentialStatus` resolves to
//! a set entry in this service's lists is reported `valid: false`. A
//! status store failure during verification is a 500, never a pass.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use ob_status::{issue_with_status, StatusListEntry, StatusPurpose};
use ob_vc::{verify_request, Credential, VerifyRequest, VerifyResponse};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

/// Error reported for a revoked credential.
pub const REVOKED_MESSAGE: &str = "credential revoked";

/// Error reported for a suspended credential.
pub const SUSPENDED_MESSAGE: &str = "credential suspended";

/// `POST /v1/credentials/status` body.
#[derive(Debug, Deserialize)]
pub struct AttachStatusRequest {
    /// Unsigned credential with an `id`.
    pub credential: Value,
}

impl Validate for AttachStatusRequest {
    fn validate(&self) -> Result<(), String> {
        match self.credential.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => Ok(()),
            _ => Err("credential must carry a non-empty id".to_string()),
        }
    }
}

/// Public credential routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/credentials/verify", post(verify))
}

/// Routes that change status state. Mounted behind the auth middleware.
pub fn status_router() -> Router<AppState> {
    Router::new()
        .route("/v1/credentials/status", post(attach_status))
        .route("/v1/credentials/{id}/revoke", post(revoke))
}

/// POST /v1/credentials/verify: proof and status verification.
async fn verify(
    State(state): State<AppState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let req = extract_json(body)?;
    let mut response = verify_request(&req)?;

    if response.valid {
        let status = Credential::from_value(req.credential)
            .ok()
            .and_then(|c| c.credential_status());
        if let Some(status) = status {
            if let Some(entry) = state.allocator.resolve(&status).await? {
                if entry.is_set() {
                    let message = match entry.purpose {
                        StatusPurpose::Revocation => REVOKED_MESSAGE,
                        StatusPurpose::Suspension => SUSPENDED_MESSAGE,
                    };
                    response = VerifyResponse::invalid(response.proof.take(), message);
                }
            }
        }
    }

    tracing::info!(
        valid = response.valid,
        error = response.error.as_deref().unwrap_or(""),
        "credential verified"
    );
    Ok(Json(response))
}

/// POST /v1/credentials/status: attach a revocation `credentialStatus`.
///
/// Allocation failures leave the credential without status rather than
/// failing issuance.
async fn attach_status(
    State(state): State<AppState>,
    body: Result<Json<AttachStatusRequest>, JsonRejection>,
) -> Result<Json<Credential>, AppError> {
    let req = extract_validated_json(body)?;
    let credential = Credential::from_value(req.credential).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let issued = issue_with_status(credential, &state.allocator, &state.config.status_list_base_url).await;
    Ok(Json(issued))
}

/// POST /v1/credentials/{id}/revoke: permanent.
async fn revoke(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusListEntry>, AppError> {
    let entry = state
        .allocator
        .set_status(&id, StatusPurpose::Revocation, 1)
        .await?;
    Ok(Json(entry))
}
