use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============= Identity Types =============

/// Free-form key/value metadata attached to an account (salon name, size, ...).
pub type UserMeta = BTreeMap<String, String>;

/// Public view of an identity. The password digest never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub id: String,
    pub email: String,
    pub name: String,
    pub primary_contact_no: Option<String>,
    pub user_meta: Option<UserMeta>,
    pub is_verified: bool,
    pub created_at: i64,
}

// ============= Authentication Types =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub primary_contact_no: Option<String>,
    #[serde(default)]
    pub user_meta: Option<UserMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Optional body for `POST /auth/refresh` when the cookie is not available.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Partial profile update. Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_contact_no: Option<String>,
    #[serde(default)]
    pub user_meta: Option<UserMeta>,
}

/// Access/refresh pair produced by every successful session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Client metadata recorded alongside a refresh token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

// ============= Response Envelope =============

/// Envelope wrapped around every successful response body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            success: status.is_success(),
            status_code: status.as_u16(),
            data,
            message: message.into(),
        }
    }
}

// ============= Error Types =============

/// Every way an authentication step can fail.
///
/// Kinds stay distinct internally (logs, tests, the `code` field of the error
/// body) even where the client-facing message is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("no token presented")]
    MissingToken,
    #[error("token signature or format is invalid")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("refresh token not found or already revoked")]
    Revoked,
    #[error("password does not match")]
    InvalidCredentials,
    #[error("no account registered for this email")]
    UnknownAccount,
    #[error("token subject no longer exists")]
    AccountNotFound,
}

impl AuthFailure {
    /// Stable machine-readable code returned in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidToken => "invalid_token",
            AuthFailure::ExpiredToken => "token_expired",
            AuthFailure::Revoked => "token_revoked",
            // One code for both so login does not reveal which emails exist
            AuthFailure::InvalidCredentials | AuthFailure::UnknownAccount => "invalid_credentials",
            AuthFailure::AccountNotFound => "account_not_found",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(AuthFailure),

    /// Authentication failure with a caller-facing message chosen by the
    /// failing component (refresh endpoint, request authenticator).
    #[error("Authentication error: {failure} ({message})")]
    AuthWithMessage {
        failure: AuthFailure,
        message: &'static str,
    },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) | AppError::AuthWithMessage { .. } => StatusCode::UNAUTHORIZED,
            AppError::AlreadyExists(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// The authentication kind behind this error, if any.
    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self {
            AppError::Auth(failure) | AppError::AuthWithMessage { failure, .. } => Some(*failure),
            _ => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
            AppError::Auth(failure) | AppError::AuthWithMessage { failure, .. } => failure.code(),
            AppError::AlreadyExists(_) => "already_exists",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                "Something went wrong, please try again later".to_string()
            }
            AppError::AuthWithMessage { message, .. } => (*message).to_string(),
            AppError::Auth(failure) => match failure {
                AuthFailure::InvalidCredentials | AuthFailure::UnknownAccount => {
                    "Invalid credentials!".to_string()
                }
                AuthFailure::MissingToken => "Unauthorized".to_string(),
                AuthFailure::AccountNotFound => "Account not found".to_string(),
                AuthFailure::InvalidToken | AuthFailure::ExpiredToken => {
                    "Unauthorized! Token expired or invalid token.".to_string()
                }
                AuthFailure::Revoked => "Refresh token not found or already revoked".to_string(),
            },
            AppError::AlreadyExists(msg) | AppError::NotFound(msg) | AppError::Validation(msg) => {
                msg.clone()
            }
        }
    }
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        AppError::Auth(failure)
    }
}

impl From<libsql::Error> for AppError {
    fn from(err: libsql::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Database(detail) | AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed with internal error");
            }
            AppError::Auth(failure) | AppError::AuthWithMessage { failure, .. } => {
                tracing::debug!(kind = failure.code(), "authentication rejected");
            }
            _ => {}
        }

        let body = serde_json::json!({
            "success": false,
            "statusCode": status.as_u16(),
            "message": self.public_message(),
            "code": self.code(),
        });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_code_and_message() {
        let unknown = AppError::Auth(AuthFailure::UnknownAccount);
        let bad_password = AppError::Auth(AuthFailure::InvalidCredentials);

        assert_eq!(unknown.code(), bad_password.code());
        assert_eq!(unknown.public_message(), bad_password.public_message());
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = AppError::Database("UNIQUE constraint failed: users.email".to_string());

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("UNIQUE"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AlreadyExists("dup".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("none".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthFailure::Revoked).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_refresh_failures_keep_distinct_codes() {
        let codes = [
            AuthFailure::MissingToken.code(),
            AuthFailure::InvalidToken.code(),
            AuthFailure::ExpiredToken.code(),
            AuthFailure::Revoked.code(),
        ];

        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_api_response_success_flag() {
        let ok: ApiResponse<()> = ApiResponse::new(StatusCode::CREATED, None, "created");
        assert!(ok.success);
        assert_eq!(ok.status_code, 201);
    }
}
