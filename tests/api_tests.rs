use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use std::sync::Arc;

use salon::{
    api::routes,
    auth::{
        cookies::{ACCESS_COOKIE, REFRESH_COOKIE},
        jwt,
        password::PasswordHasher,
    },
    AppState, AuthSettings, DatabaseClient, SalonConfig, TursoClient,
};

const ACCESS: &str = "access-secret-that-is-at-least-32-chars";
const REFRESH: &str = "refresh-secret-that-is-at-least-32-chars";

// ============= Test Helpers =============

/// Create test state over an in-memory database with cheap hashing
async fn create_test_state() -> AppState {
    let db: Arc<dyn DatabaseClient> = Arc::new(
        TursoClient::new_memory()
            .await
            .expect("Failed to create in-memory database"),
    );

    let mut config = SalonConfig::default();
    config.database.url = ":memory:".to_string();
    config.cookies.secure = false;

    let auth = AuthSettings {
        access_secret: ACCESS.to_string(),
        refresh_secret: REFRESH.to_string(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 604800,
        hasher: PasswordHasher::new(1024, 1, 1).expect("hash params"),
    };

    AppState::new(config, db, auth).expect("Failed to build state")
}

async fn create_test_server() -> (TestServer, AppState) {
    let state = create_test_state().await;
    let server =
        TestServer::new(routes::app(state.clone())).expect("Failed to create test server");
    (server, state)
}

async fn register(server: &TestServer, email: &str) -> TestResponse {
    server
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Ann Stylist",
            "email": email,
            "password": "longenough1",
            "primaryContactNo": "5550100",
            "userMeta": { "salonName": "Cut & Dry", "salonSize": "small" }
        }))
        .await
}

fn error_code(response: &TestResponse) -> String {
    let body: Value = response.json();
    body["code"].as_str().unwrap_or_default().to_string()
}

// ============= Health =============

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/v1/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "message": "Welcome to salon-server!" }));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/api/v1/auth/login"].is_object());
}

// ============= Registration =============

#[tokio::test]
async fn test_register_user() {
    let (server, _) = create_test_server().await;

    let response = register(&server, "ann@salon.test").await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["message"], "User created successfully!");
    assert_eq!(body["data"]["email"], "ann@salon.test");
    assert_eq!(body["data"]["userMeta"]["salonName"], "Cut & Dry");
    assert_eq!(body["data"]["isVerified"], false);
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());

    assert!(!response.cookie(ACCESS_COOKIE).value().is_empty());
    assert!(!response.cookie(REFRESH_COOKIE).value().is_empty());
    assert_eq!(response.cookie(ACCESS_COOKIE).http_only(), Some(true));
}

#[tokio::test]
async fn test_register_duplicate_user() {
    let (server, _) = create_test_server().await;

    register(&server, "ann@salon.test")
        .await
        .assert_status(StatusCode::CREATED);

    let response = register(&server, "ann@salon.test").await;
    response.assert_status_bad_request();
    assert_eq!(error_code(&response), "already_exists");
}

#[tokio::test]
async fn test_register_short_password() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Ann",
            "email": "ann@salon.test",
            "password": "short"
        }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_register_malformed_body() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "ann@salon.test" }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(error_code(&response), "validation_error");
}

// ============= Login =============

#[tokio::test]
async fn test_register_and_login() {
    let (server, _) = create_test_server().await;
    register(&server, "ann@salon.test").await;

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({
            "email": "ann@salon.test",
            "password": "longenough1"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Login successful!");
    assert_eq!(body["data"]["email"], "ann@salon.test");
    assert!(!response.cookie(ACCESS_COOKIE).value().is_empty());
    assert!(!response.cookie(REFRESH_COOKIE).value().is_empty());
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let (server, _) = create_test_server().await;
    register(&server, "ann@salon.test").await;

    let wrong_password = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "ann@salon.test", "password": "wrongpassword" }))
        .await;
    let unknown_email = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "nobody@salon.test", "password": "longenough1" }))
        .await;

    wrong_password.assert_status_unauthorized();
    unknown_email.assert_status_unauthorized();
    assert_eq!(wrong_password.json::<Value>(), unknown_email.json::<Value>());
}

// ============= Current User =============

#[tokio::test]
async fn test_me_with_cookie_and_bearer() {
    let (server, _) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;
    let access = registered.cookie(ACCESS_COOKIE);

    let response = server
        .get("/api/v1/auth/me")
        .add_cookie(access.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "User fetched successfully!");
    assert_eq!(body["data"]["email"], "ann@salon.test");

    let response = server
        .get("/api/v1/auth/me")
        .authorization_bearer(access.value())
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_me_without_token() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/v1/auth/me").await;
    response.assert_status_unauthorized();
    assert_eq!(error_code(&response), "missing_token");
}

#[tokio::test]
async fn test_me_with_expired_token() {
    let (server, _) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;
    let body: Value = registered.json();
    let user_id = body["data"]["id"].as_str().expect("id");

    let expired =
        jwt::sign(user_id, "ann@salon.test", ACCESS.as_bytes(), -10).expect("sign");

    let response = server
        .get("/api/v1/auth/me")
        .authorization_bearer(expired)
        .await;
    response.assert_status_unauthorized();
    assert_eq!(error_code(&response), "token_expired");
}

#[tokio::test]
async fn test_me_rejects_refresh_token() {
    let (server, _) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;
    let refresh = registered.cookie(REFRESH_COOKIE);

    let response = server
        .get("/api/v1/auth/me")
        .authorization_bearer(refresh.value())
        .await;
    response.assert_status_unauthorized();
    assert_eq!(error_code(&response), "invalid_token");
}

#[tokio::test]
async fn test_me_after_account_deleted() {
    let (server, state) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;
    let body: Value = registered.json();
    let user_id = body["data"]["id"].as_str().expect("id");

    state.db.delete_user(user_id).await.expect("delete");

    let response = server
        .get("/api/v1/auth/me")
        .add_cookie(registered.cookie(ACCESS_COOKIE))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Account not found");
}

#[tokio::test]
async fn test_update_profile() {
    let (server, _) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;

    let response = server
        .patch("/api/v1/auth/me")
        .add_cookie(registered.cookie(ACCESS_COOKIE))
        .json(&json!({ "name": "Ann Colorist" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Ann Colorist");
    assert_eq!(body["data"]["primaryContactNo"], "5550100");

    let unauthenticated = server
        .patch("/api/v1/auth/me")
        .json(&json!({ "name": "Mallory" }))
        .await;
    unauthenticated.assert_status_unauthorized();
}

// ============= Refresh =============

#[tokio::test]
async fn test_refresh_via_cookie_rotates() {
    let (server, _) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;
    let old_refresh = registered.cookie(REFRESH_COOKIE);

    let response = server
        .post("/api/v1/auth/refresh")
        .add_cookie(old_refresh.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Token refreshed!");

    let new_refresh = response.cookie(REFRESH_COOKIE);
    assert_ne!(new_refresh.value(), old_refresh.value());
    assert!(!response.cookie(ACCESS_COOKIE).value().is_empty());

    // The presented token is spent
    let replay = server
        .post("/api/v1/auth/refresh")
        .add_cookie(old_refresh)
        .await;
    replay.assert_status_unauthorized();
    let body: Value = replay.json();
    assert_eq!(body["message"], "Failed to refresh tokens");
    assert_eq!(body["code"], "token_revoked");

    // The replacement still works
    server
        .post("/api/v1/auth/refresh")
        .add_cookie(new_refresh)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_refresh_via_body() {
    let (server, _) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;
    let refresh = registered.cookie(REFRESH_COOKIE);

    let response = server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refreshToken": refresh.value() }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_refresh_missing_token() {
    let (server, _) = create_test_server().await;

    let response = server.post("/api/v1/auth/refresh").await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Refresh token missing");
    assert_eq!(body["code"], "missing_token");
}

#[tokio::test]
async fn test_refresh_with_garbage_token() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refreshToken": "not.a.jwt" }))
        .await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["message"], "Failed to refresh tokens");
    assert_eq!(body["code"], "invalid_token");
}

// ============= Logout =============

#[tokio::test]
async fn test_logout_revokes_and_clears_cookies() {
    let (server, _) = create_test_server().await;
    let registered = register(&server, "ann@salon.test").await;
    let refresh = registered.cookie(REFRESH_COOKIE);

    let response = server
        .post("/api/v1/auth/logout")
        .add_cookie(refresh.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Logout successful!");

    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        let cleared = response.cookie(name);
        assert!(cleared.value().is_empty());
        assert_eq!(cleared.max_age(), Some(cookie::time::Duration::ZERO));
    }

    // Logging out again is still a success
    server
        .post("/api/v1/auth/logout")
        .add_cookie(refresh.clone())
        .await
        .assert_status_ok();

    // The revoked token can no longer be refreshed
    let response = server
        .post("/api/v1/auth/refresh")
        .add_cookie(refresh)
        .await;
    response.assert_status_unauthorized();
    assert_eq!(error_code(&response), "token_revoked");
}

#[tokio::test]
async fn test_logout_without_token() {
    let (server, _) = create_test_server().await;

    server.post("/api/v1/auth/logout").await.assert_status_ok();
}

// ============= Body limit =============

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (server, _) = create_test_server().await;
    let oversized = "x".repeat(routes::MAX_BODY_BYTES + 1);

    for path in ["/api/v1/auth/refresh", "/api/v1/auth/logout"] {
        let response = server.post(path).text(oversized.clone()).await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    // Just under the limit reaches the handler
    let response = server
        .post("/api/v1/auth/refresh")
        .text("x".repeat(routes::MAX_BODY_BYTES - 1))
        .await;
    response.assert_status_unauthorized();
}
