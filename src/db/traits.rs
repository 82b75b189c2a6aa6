//! Database abstraction traits
//!
//! This module provides the `DatabaseClient` trait that abstracts over the
//! credential store backing the session subsystem (in-memory SQLite for tests,
//! file-based SQLite for deployments).
//!
//! # Example
//!
//! ```rust,ignore
//! use salon::db::DatabaseProvider;
//!
//! // Use in-memory database (default for development/testing)
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // Use file-based SQLite
//! let db = DatabaseProvider::SQLite { path: "data/salon.db".into() }.create_client().await?;
//! ```

use crate::types::{IdentityView, Result, UserMeta};
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
}

impl DatabaseProvider {
    /// Interprets a configured database URL. `:memory:` or an empty value
    /// selects the in-memory store.
    pub fn from_url(url: &str) -> Self {
        match url.trim() {
            "" | ":memory:" => DatabaseProvider::Memory,
            path => DatabaseProvider::SQLite {
                path: path.to_string(),
            },
        }
    }

    /// Create a database client from this provider configuration
    pub async fn create_client(&self) -> Result<Arc<dyn DatabaseClient>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Arc::new(client))
            }
        }
    }
}

/// User record from the database
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub primary_contact_no: Option<String>,
    pub user_meta: Option<UserMeta>,
    pub is_verified: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Redacted view safe to return to clients.
    pub fn view(&self) -> IdentityView {
        IdentityView {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            primary_contact_no: self.primary_contact_no.clone(),
            user_meta: self.user_meta.clone(),
            is_verified: self.is_verified,
            created_at: self.created_at,
        }
    }
}

/// Persisted refresh token. The token itself is stored only as its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: i64,
}

/// Abstract trait for credential store operations
///
/// Implementations must make `create_user_with_session` and
/// `rotate_refresh_token` atomic.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    // ============== User Operations ==============

    /// Get a user by email (exact, case-sensitive match)
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get a user by ID
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Insert a user together with its first refresh token in one transaction.
    ///
    /// Fails with `AppError::AlreadyExists` when the email is taken.
    async fn create_user_with_session(&self, user: &User, session: &RefreshTokenRecord)
        -> Result<()>;

    /// Overwrite the mutable profile fields of an existing user
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Delete a user and every refresh token it owns
    async fn delete_user(&self, id: &str) -> Result<()>;

    // ============== Refresh Token Operations ==============

    /// Persist a new refresh token
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<()>;

    /// Look up a refresh token by digest
    async fn get_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Delete every record matching the digest. Returns how many were removed.
    async fn delete_refresh_tokens(&self, token_hash: &str) -> Result<u64>;

    /// Atomically replace an unexpired record with `replacement`.
    ///
    /// A record is unexpired while `now <= expires_at`, matching when the
    /// token itself stops verifying. Returns `false` and leaves the store
    /// untouched when no unexpired record matches `old_hash` at `now`.
    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        replacement: &RefreshTokenRecord,
        now: i64,
    ) -> Result<bool>;

    /// Remove every refresh token whose expiry is strictly before `now`
    async fn delete_expired_refresh_tokens(&self, now: i64) -> Result<u64>;
}
