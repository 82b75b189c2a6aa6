//! API request handlers.

/// Authentication handlers (register, login, refresh, logout, me).
pub mod auth;
/// Liveness endpoint.
pub mod health;
