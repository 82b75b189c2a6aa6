//! Credential store.
//!
//! - [`traits`] defines the `DatabaseClient` contract used by the session layer
//! - [`turso`] implements it on libsql (in-memory or file-backed SQLite)

pub mod traits;
pub mod turso;

// Re-exports
pub use traits::{DatabaseClient, DatabaseProvider, RefreshTokenRecord, User};
pub use turso::TursoClient;
