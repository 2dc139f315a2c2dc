use axum::{routing::get, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn service_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(controller::list_services).post(controller::create_service),
        )
        .route("/{id}", get(controller::get_service))
}
