use axum::Json;

use crate::services::auth::AuthUser;
use super::schema::NotificationListResponse;

/// Placeholder listing until a notification store exists. Auth is still
/// required so the contract matches the rest of the private surface.
pub async fn list_notifications(_auth: AuthUser) -> Json<NotificationListResponse> {
    Json(NotificationListResponse {
        success: true,
        count: 0,
        data: Vec::new(),
    })
}
