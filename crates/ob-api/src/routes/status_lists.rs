//! # Status List API
//!
//! Publishes each status list as a `BitstringStatusListCredential`,
//! regenerated from the stored entries on every request.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use ob_core::Timestamp;
use ob_status::{status_list_credential, status_list_url};
use ob_vc::Credential;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Build the status lists router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/status-lists/{id}", get(get_status_list))
}

/// GET /v1/status-lists/{id}: the list as a Bitstring Status List credential.
async fn get_status_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Credential>, AppError> {
    let list_id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound(format!("status list {id}")))?;
    let store = state.allocator.store();
    let list = store
        .get_list(list_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("status list {list_id}")))?;
    let entries = store.entries_for_list(list_id).await?;

    let credential = status_list_credential(
        &list,
        &entries,
        &status_list_url(&state.config.status_list_base_url, list_id),
        &state.config.status_list_issuer,
        Timestamp::now(),
    )?;
    Ok(Json(credential))
}
