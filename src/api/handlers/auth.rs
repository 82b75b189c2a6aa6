use crate::{
    auth::{
        cookies::{cleared_cookies, read_cookie, session_cookies, REFRESH_COOKIE},
        middleware::{AuthUser, ClientMeta},
    },
    types::{
        ApiResponse, AppError, AuthFailure, IdentityView, LoginRequest, ProfilePatch,
        RefreshRequest, RegisterRequest, Result, TokenPair,
    },
    AppState,
};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde::Serialize;

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn respond<T: Serialize>(
    status: StatusCode,
    cookies: [String; 2],
    data: Option<T>,
    message: &str,
) -> Response {
    (
        status,
        AppendHeaders(cookies.map(|value| (header::SET_COOKIE, value))),
        Json(ApiResponse::new(status, data, message)),
    )
        .into_response()
}

fn issue_cookies(state: &AppState, tokens: &TokenPair) -> [String; 2] {
    let auth = state.sessions.auth_service();
    session_cookies(
        tokens,
        auth.access_ttl_secs(),
        auth.refresh_ttl_secs(),
        &state.cookies,
    )
}

/// Refresh token from the `refresh-token` cookie, else the `refreshToken` body field.
fn presented_refresh_token(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    read_cookie(headers, REFRESH_COOKIE).or_else(|| {
        if body.is_empty() {
            return None;
        }
        serde_json::from_slice::<RefreshRequest>(body)
            .ok()
            .and_then(|request| request.refresh_token)
            .filter(|token| !token.is_empty())
    })
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created; access-token and refresh-token cookies set", body = IdentityView),
        (status = 400, description = "Invalid input or email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(payload)?;
    let session = state.sessions.register(request, &client).await?;

    Ok(respond(
        StatusCode::CREATED,
        issue_cookies(&state, &session.tokens),
        Some(session.identity),
        "User created successfully!",
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; cookies set", body = IdentityView),
        (status = 400, description = "Malformed input"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let request = json_body(payload)?;
    let session = state.sessions.login(request, &client).await?;

    Ok(respond(
        StatusCode::OK,
        issue_cookies(&state, &session.tokens),
        Some(session.identity),
        "Login successful!",
    ))
}

/// Rotate the refresh token and issue a new token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body(content = RefreshRequest, description = "Only needed when the refresh-token cookie is absent"),
    responses(
        (status = 200, description = "Token refreshed; cookies replaced"),
        (status = 401, description = "Missing, invalid, expired or revoked refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let presented = presented_refresh_token(&headers, &body);

    let tokens = state
        .sessions
        .refresh(presented.as_deref(), &client)
        .await
        .map_err(|err| match err.auth_failure() {
            Some(AuthFailure::MissingToken) => AppError::AuthWithMessage {
                failure: AuthFailure::MissingToken,
                message: "Refresh token missing",
            },
            Some(failure) => AppError::AuthWithMessage {
                failure,
                message: "Failed to refresh tokens",
            },
            None => err,
        })?;

    Ok(respond::<()>(
        StatusCode::OK,
        issue_cookies(&state, &tokens),
        None,
        "Token refreshed!",
    ))
}

/// Revoke the presented refresh token and clear both cookies
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    request_body(content = RefreshRequest, description = "Only needed when the refresh-token cookie is absent"),
    responses((status = 200, description = "Logged out; cookies cleared")),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let presented = presented_refresh_token(&headers, &body);
    state.sessions.logout(presented.as_deref()).await;

    respond::<()>(
        StatusCode::OK,
        cleared_cookies(&state.cookies),
        None,
        "Logout successful!",
    )
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = IdentityView),
        (status = 401, description = "Missing, invalid or expired access token, or account not found")
    ),
    tag = "auth"
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<IdentityView>> {
    Json(ApiResponse::new(
        StatusCode::OK,
        Some(user.view()),
        "User fetched successfully!",
    ))
}

/// Update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/api/v1/auth/me",
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Profile updated", body = IdentityView),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: std::result::Result<Json<ProfilePatch>, JsonRejection>,
) -> Result<Json<ApiResponse<IdentityView>>> {
    let patch = json_body(payload)?;
    let view = state.sessions.update_profile(&user, patch).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK,
        Some(view),
        "Profile updated successfully!",
    )))
}
