//! # ob-api: Axum API Service
//!
//! HTTP surface of the Open Badges engine, built on Axum/Tower/Tokio.
//!
//! ## Routes
//!
//! - `POST /v1/credentials/verify`: proof verification plus status check
//! - `POST /v1/credentials/status`: attach a revocation `credentialStatus`
//!   (bearer token)
//! - `POST /v1/credentials/{id}/revoke`: revoke an issued credential
//!   (bearer token)
//! - `POST /v1/bake`, `POST /v1/unbake`: image baking
//! - `GET /v1/status-lists/{id}`: Bitstring Status List credential
//! - `/health/*`: liveness and readiness probes
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; they delegate to the domain crates.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the application router.
///
/// Status-changing routes sit behind the bearer token middleware; health
/// probes and the read and verify routes do not.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let guarded = routes::credentials::status_router()
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    let api = Router::new()
        .merge(routes::credentials::router())
        .merge(guarded)
        .merge(routes::baking::router())
        .merge(routes::status_lists::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
async fn readiness() -> &'static str {
    "ready"
}
