use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<serde_json::Value>,
}
