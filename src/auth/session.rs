//! Session lifecycle: registration, login, refresh-token rotation, logout and
//! per-request authentication.
//!
//! Every successful entry point mints its tokens through
//! `SessionManager::issue_session`, so token issuance never drifts between
//! register, login and refresh.

use crate::auth::jwt::AuthService;
use crate::db::traits::{DatabaseClient, RefreshTokenRecord, User};
use crate::types::{
    AppError, AuthFailure, ClientInfo, IdentityView, LoginRequest, ProfilePatch, RegisterRequest,
    Result, TokenPair,
};
use crate::utils::validation;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Identity plus the token pair issued for it.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: IdentityView,
    pub tokens: TokenPair,
}

/// Freshly signed tokens and the refresh record that still has to be persisted.
struct IssuedSession {
    tokens: TokenPair,
    record: RefreshTokenRecord,
}

impl ProfilePatch {
    /// Merges the patch over `existing`. An explicit value wins, otherwise the
    /// stored value is kept.
    pub fn apply(&self, existing: &User, now: i64) -> User {
        User {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            primary_contact_no: self
                .primary_contact_no
                .clone()
                .or_else(|| existing.primary_contact_no.clone()),
            user_meta: self.user_meta.clone().or_else(|| existing.user_meta.clone()),
            updated_at: now,
            ..existing.clone()
        }
    }
}

pub struct SessionManager {
    db: Arc<dyn DatabaseClient>,
    auth: Arc<AuthService>,
}

impl SessionManager {
    pub fn new(db: Arc<dyn DatabaseClient>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth
    }

    /// Creates an account and its first session.
    ///
    /// Tokens are signed before the store is touched; the identity and its
    /// refresh record are then written in one transaction.
    pub async fn register(&self, request: RegisterRequest, client: &ClientInfo) -> Result<Session> {
        validation::validate_register(&request)?;

        if self.db.get_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::AlreadyExists(
                "User already exists with this email!".to_string(),
            ));
        }

        let password_hash = self.auth.hash_password(&request.password).await?;
        let now = Utc::now().timestamp();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: request.email,
            password_hash,
            name: request.name.trim().to_string(),
            primary_contact_no: request.primary_contact_no,
            user_meta: request.user_meta,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        let issued = self.issue_session(&user.id, &user.email, client)?;
        self.db
            .create_user_with_session(&user, &issued.record)
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(Session {
            identity: user.view(),
            tokens: issued.tokens,
        })
    }

    /// Authenticates with email and password and opens a new session.
    pub async fn login(&self, request: LoginRequest, client: &ClientInfo) -> Result<Session> {
        validation::validate_login(&request)?;

        let user = self
            .db
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                tracing::info!("login rejected: unknown email");
                AppError::Auth(AuthFailure::UnknownAccount)
            })?;

        if !self
            .auth
            .verify_password(&request.password, &user.password_hash)
            .await?
        {
            tracing::info!(user_id = %user.id, "login rejected: bad password");
            return Err(AuthFailure::InvalidCredentials.into());
        }

        let issued = self.issue_session(&user.id, &user.email, client)?;
        self.db.create_refresh_token(&issued.record).await?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(Session {
            identity: user.view(),
            tokens: issued.tokens,
        })
    }

    /// Signs a fresh access/refresh pair and builds the refresh record for it.
    fn issue_session(&self, user_id: &str, email: &str, client: &ClientInfo) -> Result<IssuedSession> {
        let (tokens, refresh_exp) = self.auth.issue_tokens(user_id, email)?;
        let now = Utc::now().timestamp();

        // Record and token must agree on expiry, so take it from the signed claim.
        let record = RefreshTokenRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token_hash: self.auth.hash_token(&tokens.refresh_token),
            expires_at: refresh_exp,
            user_agent: client.user_agent.clone(),
            ip_address: client.ip_address.clone(),
            created_at: now,
        };

        Ok(IssuedSession { tokens, record })
    }

    /// Rotates a refresh token: the presented token is revoked and a new pair
    /// is returned.
    ///
    /// Of several concurrent calls with the same token, exactly one succeeds;
    /// the others observe the record gone and fail with `Revoked`.
    pub async fn refresh(&self, presented: Option<&str>, client: &ClientInfo) -> Result<TokenPair> {
        let token = presented
            .filter(|t| !t.is_empty())
            .ok_or(AuthFailure::MissingToken)?;

        let claims = self.auth.verify_refresh_token(token).map_err(|failure| {
            tracing::info!(kind = failure.code(), "refresh rejected");
            AppError::Auth(failure)
        })?;

        let token_hash = self.auth.hash_token(token);
        let existing = self
            .db
            .get_refresh_token(&token_hash)
            .await?
            .filter(|record| record.user_id == claims.sub)
            .ok_or_else(|| {
                tracing::warn!(user_id = %claims.sub, "refresh with revoked token");
                AppError::Auth(AuthFailure::Revoked)
            })?;

        // Metadata from this request wins; otherwise carry over what the old record had
        let client = ClientInfo {
            user_agent: client.user_agent.clone().or(existing.user_agent),
            ip_address: client.ip_address.clone().or(existing.ip_address),
        };

        let issued = self.issue_session(&claims.sub, &claims.email, &client)?;
        let rotated = self
            .db
            .rotate_refresh_token(&token_hash, &issued.record, Utc::now().timestamp())
            .await?;

        if !rotated {
            tracing::warn!(user_id = %claims.sub, "refresh lost rotation race");
            return Err(AuthFailure::Revoked.into());
        }

        tracing::debug!(user_id = %claims.sub, "refresh token rotated");
        Ok(issued.tokens)
    }

    /// Revokes every record matching the presented token. Never fails.
    pub async fn logout(&self, presented: Option<&str>) {
        let Some(token) = presented.filter(|t| !t.is_empty()) else {
            return;
        };

        match self.db.delete_refresh_tokens(&self.auth.hash_token(token)).await {
            Ok(removed) => tracing::debug!(removed, "logout"),
            Err(e) => tracing::error!(error = %e, "failed to revoke refresh token on logout"),
        }
    }

    /// Resolves an access token to the identity it belongs to.
    ///
    /// Verifies from scratch on every call and performs exactly one store
    /// lookup.
    pub async fn authenticate(&self, presented: Option<&str>) -> Result<User> {
        let token = presented
            .filter(|t| !t.is_empty())
            .ok_or(AuthFailure::MissingToken)?;

        let claims = self.auth.verify_access_token(token).map_err(|failure| {
            tracing::debug!(kind = failure.code(), "access token rejected");
            AppError::Auth(failure)
        })?;

        self.db.get_user_by_id(&claims.sub).await?.ok_or_else(|| {
            tracing::info!(user_id = %claims.sub, "token subject no longer exists");
            AppError::Auth(AuthFailure::AccountNotFound)
        })
    }

    /// Applies a partial profile update and returns the stored result.
    pub async fn update_profile(&self, current: &User, patch: ProfilePatch) -> Result<IdentityView> {
        validation::validate_profile_patch(&patch)?;

        let updated = patch.apply(current, Utc::now().timestamp());
        self.db.update_user(&updated).await?;

        tracing::info!(user_id = %updated.id, "profile updated");
        Ok(updated.view())
    }

    /// Deletes refresh records that are past their expiry.
    pub async fn prune_expired(&self) -> Result<u64> {
        self.db
            .delete_expired_refresh_tokens(Utc::now().timestamp())
            .await
    }
}

/// Runs [`SessionManager::prune_expired`] every `every` until the runtime shuts down.
pub fn spawn_pruner(sessions: Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sessions.prune_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "pruned expired refresh tokens"),
                Err(e) => tracing::warn!(error = %e, "failed to prune refresh tokens"),
            }
        }
    })
}
