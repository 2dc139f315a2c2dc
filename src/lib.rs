pub mod config;
pub mod error;
pub mod modules;
pub mod services;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::HeaderValue;
use axum::{middleware, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::environment::Config;
use config::DbPool;
use modules::appointments::appointment_routes;
use modules::auth::auth_routes;
use modules::notifications::notification_routes;
use modules::services::service_routes;
use modules::users::user_routes;
use services::jwt::JwtService;
use services::rate_limit::{
    create_rate_limiter, AuthFailureTracker, AuthRateLimitLayer, RateLimitLayer,
};
use services::realtime::{ws_handler, RoomHub};
use services::security::security_headers;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: JwtService,
    pub hub: Arc<RoomHub>,
    pub environment: String,
    pub started_at: Instant,
}

pub async fn create_app(db: DbPool, jwt_service: JwtService, config: &Config) -> Router {
    let state = Arc::new(AppState {
        db,
        jwt_service,
        hub: Arc::new(RoomHub::new()),
        environment: config.environment.clone(),
        started_at: Instant::now(),
    });

    let rate_limiter = create_rate_limiter(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    );

    // Auth endpoints get a stricter budget where only failures count.
    let auth_tracker = Arc::new(AuthFailureTracker::new(
        config.auth_rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    let cors = match config
        .cors_origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(origins) if !origins.is_empty() => CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        _ => CorsLayer::permissive(),
    };

    Router::new()
        .route("/api/health", get(health_check))
        .route("/ws", get(ws_handler))
        .nest(
            "/api/auth",
            auth_routes().layer(AuthRateLimitLayer::new(auth_tracker)),
        )
        .nest("/api/services", service_routes())
        .nest("/api/appointments", appointment_routes())
        .nest("/api/users", user_routes())
        .nest("/api/notifications", notification_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    environment: String,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs(),
        environment: state.environment.clone(),
    })
}
