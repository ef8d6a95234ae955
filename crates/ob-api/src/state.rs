//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! AppState holds only what outlives a request: the configuration and the
//! status list allocator. Baking and verification are pure functions of
//! the request body.

use std::sync::Arc;

use ob_status::{MemoryStatusStore, StatusAllocator, StatusStore, DEFAULT_CAPACITY};
use thiserror::Error;

/// Runtime configuration, read from the environment.
///
/// `Debug` redacts the bearer token and the database URL.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Postgres URL. `None` selects the in-memory status store.
    pub database_url: Option<String>,
    /// Base URL under which status list credentials are published.
    pub status_list_base_url: String,
    /// `issuer` of published status list credentials.
    pub status_list_issuer: String,
    /// Capacity of newly created status lists.
    pub status_list_capacity: u64,
    /// Bearer token for status-changing routes. `None` disables them.
    pub auth_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("status_list_base_url", &self.status_list_base_url)
            .field("status_list_issuer", &self.status_list_issuer)
            .field("status_list_capacity", &self.status_list_capacity)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
            status_list_base_url: "http://localhost:8080/v1/status-lists".to_string(),
            status_list_issuer: "did:web:localhost".to_string(),
            status_list_capacity: DEFAULT_CAPACITY,
            auth_token: None,
        }
    }
}

/// A malformed environment variable.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid {name}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub reason: String,
}

impl AppConfig {
    /// Read `PORT`, `DATABASE_URL`, `STATUS_LIST_BASE_URL`,
    /// `STATUS_LIST_ISSUER`, `STATUS_LIST_CAPACITY` and `AUTH_TOKEN`. Unset
    /// variables take their defaults; set but unparseable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(v) => v.parse::<u16>().map_err(|e| ConfigError {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };
        let status_list_capacity = match get("STATUS_LIST_CAPACITY") {
            Some(v) => match v.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError {
                        name: "STATUS_LIST_CAPACITY",
                        reason: "must be positive".to_string(),
                    })
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError {
                        name: "STATUS_LIST_CAPACITY",
                        reason: e.to_string(),
                    })
                }
            },
            None => defaults.status_list_capacity,
        };

        Ok(Self {
            port,
            database_url: get("DATABASE_URL"),
            status_list_base_url: get("STATUS_LIST_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.status_list_base_url),
            status_list_issuer: get("STATUS_LIST_ISSUER").unwrap_or(defaults.status_list_issuer),
            status_list_capacity,
            auth_token: get("AUTH_TOKEN"),
        })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub allocator: StatusAllocator,
}

impl AppState {
    /// Default configuration over an in-memory status store.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// `config` over an in-memory status store.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStatusStore::new()))
    }

    /// `config` over an arbitrary status store.
    pub fn with_store(config: AppConfig, store: Arc<dyn StatusStore>) -> Self {
        let allocator = StatusAllocator::new(store).with_capacity(config.status_list_capacity);
        Self {
            config: Arc::new(config),
            allocator,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
