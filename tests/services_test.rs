mod common;

use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use common::TestContext;
use medbook_api::modules::users::model::Role;

fn service_body(name: &str, duration: u32) -> serde_json::Value {
    json!({
        "name": name,
        "description": "Professional dental cleaning and oral health examination",
        "duration": duration,
        "price": { "amount": 80.0, "currency": "USD" },
        "category": "treatment"
    })
}

#[tokio::test]
#[serial]
async fn admin_can_create_service() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Admin).await;

    let response = ctx
        .server
        .post("/api/services")
        .authorization_bearer(&token)
        .json(&service_body("Dental Cleaning", 45))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Dental Cleaning");
    assert_eq!(body["data"]["isActive"], true);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn client_cannot_create_service() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Client).await;

    let response = ctx
        .server
        .post("/api/services")
        .authorization_bearer(&token)
        .json(&service_body("Massage", 60))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_without_token_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/api/services")
        .json(&service_body("Massage", 60))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn duration_below_minimum_is_rejected_and_not_persisted() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Admin).await;

    let response = ctx
        .server
        .post("/api/services")
        .authorization_bearer(&token)
        .json(&service_body("Quick Chat", 10))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["errors"].is_array());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM services")
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count.0, 0);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn duration_above_maximum_is_rejected() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Admin).await;

    let response = ctx
        .server
        .post("/api/services")
        .authorization_bearer(&token)
        .json(&service_body("All Day Retreat", 481))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn public_listing_returns_active_services_with_staff_expanded() {
    let ctx = TestContext::new().await;
    let (_, admin_token) = ctx.seed_and_login(Role::Admin).await;
    let staff = ctx.seed_user(Role::Staff, common::test_password()).await;

    let mut body = service_body("General Consultation", 30);
    body["staffMembers"] = json!([staff.id]);
    ctx.server
        .post("/api/services")
        .authorization_bearer(&admin_token)
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx.server.get("/api/services").await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["staffMembers"][0]["id"], json!(staff.id));
    assert!(body["data"][0]["staffMembers"][0].get("passwordHash").is_none());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn listing_is_sorted_by_name() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Admin).await;

    for name in ["Zen Therapy", "Acupuncture", "Massage"] {
        ctx.server
            .post("/api/services")
            .authorization_bearer(&token)
            .json(&service_body(name, 60))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = ctx.server.get("/api/services").await;
    let body: serde_json::Value = response.json();

    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Acupuncture", "Massage", "Zen Therapy"]);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn get_unknown_service_returns_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/api/services/no-such-id").await;

    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn inactive_service_is_hidden_from_get_and_list() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Admin).await;
    let id = ctx.seed_service(&token, &[]).await;

    sqlx::query("UPDATE services SET is_active = FALSE WHERE id = ?")
        .bind(&id)
        .execute(&ctx.db)
        .await
        .unwrap();

    ctx.server
        .get(&format!("/api/services/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let body: serde_json::Value = ctx.server.get("/api/services").await.json();
    assert_eq!(body["count"], 0);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn first_image_is_promoted_to_primary_when_none_flagged() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Admin).await;

    let mut body = service_body("Physio Session", 60);
    body["images"] = json!([
        { "url": "https://cdn.example.com/a.jpg", "alt": "room" },
        { "url": "https://cdn.example.com/b.jpg", "alt": "equipment" }
    ]);

    let response = ctx
        .server
        .post("/api/services")
        .authorization_bearer(&token)
        .json(&body)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["images"][0]["isPrimary"], true);
    assert_eq!(body["data"]["images"][1]["isPrimary"], false);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn extra_primary_images_are_demoted() {
    let ctx = TestContext::new().await;
    let (_, token) = ctx.seed_and_login(Role::Admin).await;

    let mut body = service_body("Checkup Special", 30);
    body["images"] = json!([
        { "url": "https://cdn.example.com/a.jpg", "alt": "a", "isPrimary": true },
        { "url": "https://cdn.example.com/b.jpg", "alt": "b", "isPrimary": true }
    ]);

    let response = ctx
        .server
        .post("/api/services")
        .authorization_bearer(&token)
        .json(&body)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let primaries: Vec<bool> = body["data"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["isPrimary"].as_bool().unwrap())
        .collect();
    assert_eq!(primaries.iter().filter(|p| **p).count(), 1);

    ctx.cleanup().await;
}
