mod common;

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use common::{test_email, test_password, TestContext};
use medbook_api::modules::users::model::Role;

fn register_body(email: &str) -> serde_json::Value {
    json!({
        "firstName": "Demo",
        "lastName": "User",
        "email": email,
        "password": test_password(),
        "phone": "+1234567890"
    })
}

#[tokio::test]
#[serial]
async fn register_returns_token_and_client_role() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/auth/register")
        .json(&register_body(&test_email()))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["role"], "client");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_ignores_caller_supplied_role() {
    let ctx = TestContext::new().await;

    let mut body = register_body(&test_email());
    body["role"] = json!("admin");

    let response = ctx.server.post("/api/auth/register").json(&body).await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["role"], "client");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_rejects_duplicate_email() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/api/auth/register")
        .json(&register_body(&email))
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx
        .server
        .post("/api/auth/register")
        .json(&register_body(&email))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_rejects_short_password() {
    let ctx = TestContext::new().await;

    let mut body = register_body(&test_email());
    body["password"] = json!("abc");

    let response = ctx.server.post("/api/auth/register").json(&body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["errors"].is_array());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_never_returns_password_material() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/auth/register")
        .json(&register_body(&test_email()))
        .await;

    let body: serde_json::Value = response.json();
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn login_with_valid_credentials_returns_token_and_user() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user(Role::Admin, "admin123").await;

    let response = ctx
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": &user.email, "password": "admin123" }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["role"], "admin");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn login_with_wrong_password_returns_unauthorized() {
    let ctx = TestContext::new().await;
    let user = ctx.seed_user(Role::Client, test_password()).await;

    let response = ctx
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": &user.email, "password": "WrongPassword1!" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn login_with_nonexistent_email_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": test_email(), "password": test_password() }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn me_returns_current_user() {
    let ctx = TestContext::new().await;
    let (user, token) = ctx.seed_and_login(Role::Client).await;

    let response = ctx
        .server
        .get("/api/auth/me")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["id"], json!(user.id));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn me_without_token_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/api/auth/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn repeated_login_failures_hit_the_auth_limiter() {
    let ctx = TestContext::with_auth_limit(3).await;
    let user = ctx.seed_user(Role::Client, test_password()).await;

    for _ in 0..3 {
        ctx.server
            .post("/api/auth/login")
            .json(&json!({ "email": &user.email, "password": "bad-password" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    // Budget exhausted: even a correct login is throttled now.
    let response = ctx
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": &user.email, "password": test_password() }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn successful_logins_do_not_consume_auth_quota() {
    let ctx = TestContext::with_auth_limit(3).await;
    let user = ctx.seed_user(Role::Client, test_password()).await;

    for _ in 0..5 {
        ctx.server
            .post("/api/auth/login")
            .json(&json!({ "email": &user.email, "password": test_password() }))
            .await
            .assert_status(StatusCode::OK);
    }

    ctx.cleanup().await;
}
