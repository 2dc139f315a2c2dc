use axum_test::TestServer;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{MySql, Pool};
use uuid::Uuid;

use medbook_api::config::environment::Config;
use medbook_api::modules::users::crud::UserCrud;
use medbook_api::modules::users::model::{Preferences, Role, User};
use medbook_api::services::hashing;
use medbook_api::services::jwt::JwtService;

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub db: Pool<MySql>,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

        let db = sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let config = Config {
            database_url,
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            jwt_expires_days: 7,
            port: 0,
            environment: "test".to_string(),
            cors_origins: vec![],
            rate_limit_window_secs: 900,
            // High ceilings so throttling never interferes with other suites.
            rate_limit_max: 100_000,
            auth_rate_limit_max: 100_000,
        };

        let jwt_service = JwtService::new(config.jwt_secret.clone(), config.jwt_expires_days);
        let app = medbook_api::create_app(db.clone(), jwt_service, &config).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, db }
    }

    /// Build a context whose auth endpoints block after `max` failed attempts.
    pub async fn with_auth_limit(max: u32) -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

        let db = sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let config = Config {
            database_url,
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            jwt_expires_days: 7,
            port: 0,
            environment: "test".to_string(),
            cors_origins: vec![],
            rate_limit_window_secs: 900,
            rate_limit_max: 100_000,
            auth_rate_limit_max: max,
        };

        let jwt_service = JwtService::new(config.jwt_secret.clone(), config.jwt_expires_days);
        let app = medbook_api::create_app(db.clone(), jwt_service, &config).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, db }
    }

    pub async fn cleanup(&self) {
        sqlx::query("DELETE FROM appointments")
            .execute(&self.db)
            .await
            .ok();
        sqlx::query("DELETE FROM services")
            .execute(&self.db)
            .await
            .ok();
        sqlx::query("DELETE FROM users").execute(&self.db).await.ok();
    }

    /// Insert a user directly with the given role; registration only ever
    /// produces clients, so staff/admin fixtures go through here.
    pub async fn seed_user(&self, role: Role, password: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: test_email(),
            password_hash: hashing::hash_password(password).unwrap(),
            phone: "+1234567890".to_string(),
            role,
            is_active: true,
            is_email_verified: true,
            email_verification_token: None,
            email_verification_expires: None,
            reset_password_token: None,
            reset_password_expires: None,
            preferences: Json(Preferences::default()),
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        UserCrud::new(self.db.clone()).create(&user).await.unwrap();
        user
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .await;

        let body: serde_json::Value = response.json();
        body["token"]
            .as_str()
            .unwrap_or_else(|| panic!("login did not return a token: {}", body))
            .to_string()
    }

    pub async fn seed_and_login(&self, role: Role) -> (User, String) {
        let user = self.seed_user(role, test_password()).await;
        let token = self.login(&user.email, test_password()).await;
        (user, token)
    }

    /// Minimal valid service created through the admin API. Returns the
    /// service id.
    pub async fn seed_service(&self, admin_token: &str, staff_ids: &[&str]) -> String {
        let response = self
            .server
            .post("/api/services")
            .authorization_bearer(admin_token)
            .json(&serde_json::json!({
                "name": format!("Consultation {}", Uuid::new_v4()),
                "description": "General health consultation",
                "duration": 30,
                "price": { "amount": 100.0, "currency": "USD" },
                "category": "consultation",
                "staffMembers": staff_ids,
            }))
            .await;

        let body: serde_json::Value = response.json();
        body["data"]["id"]
            .as_str()
            .unwrap_or_else(|| panic!("service creation failed: {}", body))
            .to_string()
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", Uuid::new_v4())
}

// Helper to generate test password
#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}
