//! # Database Persistence Layer
//!
//! Postgres persistence for status lists via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set, status lists
//! and entries live in Postgres and survive restarts. When absent, the
//! service allocates from an in-memory store (development and tests).
//!
//! Nothing else is persisted: bake, unbake and verify are stateless.

pub mod status_lists;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub use status_lists::PgStatusStore;

/// Connect and run migrations.
///
/// Returns `None` if `database_url` is `None` (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set, using in-memory status lists. \
             Revocations will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
