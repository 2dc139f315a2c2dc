use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{Preferences, Role, User};

/// Serialized user shape. Credential material (the password hash) and
/// pending token fields never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub preferences: Preferences,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            is_email_verified: user.is_email_verified,
            preferences: user.preferences.0,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct SingleUserResponse {
    pub success: bool,
    pub data: UserResponse,
}
