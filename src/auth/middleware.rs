use crate::auth::cookies::{read_cookie, ACCESS_COOKIE};
use crate::db::traits::User;
use crate::types::{AppError, AuthFailure, ClientInfo};
use crate::AppState;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Access token from the `access-token` cookie, else from `Authorization: Bearer`.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    read_cookie(headers, ACCESS_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

/// Gate for protected routes: resolves the access token to an account and
/// attaches it to the request for downstream handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_access_token(req.headers());
    let user = state.sessions.authenticate(token.as_deref()).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// The authenticated account, as attached by [`auth_middleware`].
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Auth(AuthFailure::MissingToken))
    }
}

/// User agent and client address of the caller.
///
/// The address is the first `X-Forwarded-For` hop when present, otherwise the
/// socket peer (available when served with connect info).
pub struct ClientMeta(pub ClientInfo);

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta(client_info(parts)))
    }
}

fn client_info(parts: &Parts) -> ClientInfo {
    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);

    let ip_address = forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    ClientInfo {
        user_agent,
        ip_address,
    }
}
