//! Authentication and session management
//!
//! This module provides the cookie-based JWT session subsystem for the salon
//! API: credential hashing, token signing, refresh-token rotation and the
//! middleware that guards protected routes.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id password hashing
//! - [`auth::jwt`](crate::auth::jwt) - Token signing/verification and `AuthService`
//! - [`auth::session`](crate::auth::session) - Register, login, refresh, logout, authenticate
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and extractors
//! - [`auth::cookies`](crate::auth::cookies) - `access-token` / `refresh-token` cookies
//!
//! # Token Lifecycle
//!
//! - **Access tokens** are stateless HS256 JWTs (default 15 minutes), verified
//!   on every protected request.
//! - **Refresh tokens** are JWTs signed with a separate secret (default 7 days)
//!   and tracked server-side by digest. Each refresh deletes the presented
//!   record and inserts its replacement in one transaction, so a refresh token
//!   can be used exactly once.
//!
//! # Usage
//!
//! ```ignore
//! use salon::auth::session::SessionManager;
//!
//! let sessions = SessionManager::new(db, auth_service);
//! let session = sessions.login(request, &client_info).await?;
//! let rotated = sessions.refresh(Some(&session.tokens.refresh_token), &client_info).await?;
//! ```
//!
//! # Configuration
//!
//! Configure via `salon.toml`:
//! ```toml
//! [auth]
//! access_secret_env = "ACCESS_TOKEN_SECRET"   # Required, at least 32 bytes
//! refresh_secret_env = "REFRESH_TOKEN_SECRET" # Required, must differ from the access secret
//! access_token_ttl = 900
//! refresh_token_ttl = 604800
//! ```

/// HttpOnly cookie transport for session tokens.
pub mod cookies;
/// JWT token generation, validation, and the authentication service.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing.
pub mod password;
/// Session lifecycle orchestration.
pub mod session;
