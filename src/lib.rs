//! # salon-server
//!
//! Authentication and session backend for a multi-tenant salon and spa
//! management product, built in Rust on Axum.
//!
//! ## Overview
//!
//! salon-server can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `salon-server` binary
//! 2. **As a library** - Mount the router or drive [`SessionManager`] directly
//!
//! Users register with email and password, log in, and receive a short-lived
//! access token plus a long-lived refresh token as HttpOnly cookies. Refresh
//! tokens are tracked server-side and rotated on every use, so each one can be
//! redeemed exactly once.
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use salon::{AppState, SalonConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SalonConfig::load("salon.toml")?;
//!     let auth = config.auth_settings()?;
//!     let db = config.database_provider().create_client().await?;
//!
//!     let state = AppState::new(config, db, auth)?;
//!     let app = salon::api::routes::app(state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `swagger-ui` | Interactive API docs at `/swagger-ui/` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Password hashing, JWTs, sessions, cookies and middleware
//! - [`cli`] - Command-line interface for the server binary
//! - [`db`] - Credential store (libsql)
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration and input validation

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication, sessions and middleware.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Credential store.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration and validation utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::jwt::{AuthService, AuthSettings};
pub use auth::session::{Session, SessionManager};
pub use db::{DatabaseClient, DatabaseProvider, TursoClient};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigError, SalonConfig};

use crate::auth::cookies::CookieSettings;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Infrastructure configuration loaded from `salon.toml`
    pub config: Arc<SalonConfig>,
    /// Credential store
    pub db: Arc<dyn DatabaseClient>,
    /// Session lifecycle (register, login, refresh, logout, authenticate)
    pub sessions: Arc<SessionManager>,
    /// Attributes applied to the session cookies
    pub cookies: Arc<CookieSettings>,
}

impl AppState {
    /// Wires the session layer over `db` using resolved signing settings.
    pub fn new(
        config: SalonConfig,
        db: Arc<dyn DatabaseClient>,
        auth: AuthSettings,
    ) -> std::result::Result<Self, ConfigError> {
        let cookies = config.cookie_settings()?;
        let auth_service = Arc::new(AuthService::new(auth));
        let sessions = Arc::new(SessionManager::new(db.clone(), auth_service));

        Ok(Self {
            config: Arc::new(config),
            db,
            sessions,
            cookies: Arc::new(cookies),
        })
    }
}
