use axum::{routing::get, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn appointment_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/",
        get(controller::list_appointments).post(controller::create_appointment),
    )
}
