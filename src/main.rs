use std::sync::Arc;

use medbook_api::config::{environment::Config, init_db};
use medbook_api::services::jwt::JwtService;
use medbook_api::services::tasks::{spawn_scheduled_tasks, LogReminderSender};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medbook_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url).await;
    tracing::info!("Connected to MySQL");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run migrations");

    let jwt_service = JwtService::new(config.jwt_secret.clone(), config.jwt_expires_days);

    spawn_scheduled_tasks(db.clone(), Arc::new(LogReminderSender));

    let app = medbook_api::create_app(db, jwt_service, &config).await;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, app).await.unwrap();
}
