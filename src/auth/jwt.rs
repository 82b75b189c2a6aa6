use crate::auth::password::PasswordHasher;
use crate::types::{AppError, AuthFailure, Result, TokenPair};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Identity claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique per signing event, so two tokens minted in the same second differ.
    pub jti: String,
}

/// Signs a token for `sub`/`email` that expires `ttl_secs` from now.
///
/// A negative TTL produces an already-expired token.
pub fn sign(sub: &str, email: &str, secret: &[u8], ttl_secs: i64) -> Result<String> {
    sign_with_expiry(sub, email, secret, ttl_secs).map(|(token, _)| token)
}

/// Like [`sign`], also returning the `exp` claim that was signed.
pub fn sign_with_expiry(
    sub: &str,
    email: &str,
    secret: &[u8],
    ttl_secs: i64,
) -> Result<(String, i64)> {
    let now = Utc::now();
    let exp = TimeDelta::try_seconds(ttl_secs)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal(format!("Token lifetime out of range: {}s", ttl_secs)))?
        .timestamp();

    let claims = Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

    Ok((token, exp))
}

/// Verifies signature first, then expiry, and returns the embedded claims.
pub fn verify(token: &str, secret: &[u8]) -> std::result::Result<Claims, AuthFailure> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthFailure::ExpiredToken,
            _ => AuthFailure::InvalidToken,
        })
}

/// Secret and lifetime for one token family.
#[derive(Clone)]
pub struct TokenKey {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenKey {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn sign(&self, sub: &str, email: &str) -> Result<String> {
        sign(sub, email, &self.secret, self.ttl_secs)
    }

    pub fn sign_with_expiry(&self, sub: &str, email: &str) -> Result<(String, i64)> {
        sign_with_expiry(sub, email, &self.secret, self.ttl_secs)
    }

    pub fn verify(&self, token: &str) -> std::result::Result<Claims, AuthFailure> {
        verify(token, &self.secret)
    }
}

/// Everything the authentication service needs, resolved once at startup.
#[derive(Clone)]
pub struct AuthSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub hasher: PasswordHasher,
}

/// Authentication service for JWT token management and password hashing.
///
/// Access and refresh tokens are signed with independent secrets, so holding
/// one kind of token never lets a client forge the other.
pub struct AuthService {
    access: TokenKey,
    refresh: TokenKey,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(settings: AuthSettings) -> Self {
        Self {
            access: TokenKey::new(settings.access_secret, settings.access_ttl_secs),
            refresh: TokenKey::new(settings.refresh_secret, settings.refresh_ttl_secs),
            hasher: settings.hasher,
        }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String> {
        self.hasher.hash_async(password.to_string()).await
    }

    pub async fn verify_password(&self, password: &str, digest: &str) -> Result<bool> {
        self.hasher
            .verify_async(password.to_string(), digest.to_string())
            .await
    }

    /// Signs a fresh access/refresh pair for an identity.
    pub fn generate_tokens(&self, user_id: &str, email: &str) -> Result<TokenPair> {
        self.issue_tokens(user_id, email).map(|(tokens, _)| tokens)
    }

    /// Signs a fresh pair and returns it with the refresh token's `exp` claim.
    pub fn issue_tokens(&self, user_id: &str, email: &str) -> Result<(TokenPair, i64)> {
        let access_token = self.access.sign(user_id, email)?;
        let (refresh_token, refresh_exp) = self.refresh.sign_with_expiry(user_id, email)?;

        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            refresh_exp,
        ))
    }

    pub fn verify_access_token(&self, token: &str) -> std::result::Result<Claims, AuthFailure> {
        self.access.verify(token)
    }

    pub fn verify_refresh_token(&self, token: &str) -> std::result::Result<Claims, AuthFailure> {
        self.refresh.verify(token)
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access.ttl_secs()
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh.ttl_secs()
    }

    /// Hashes a token using SHA256 for storage lookups.
    pub fn hash_token(&self, token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}
