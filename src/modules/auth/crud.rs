use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::types::Json;
use sqlx::{MySql, Pool};
use uuid::Uuid;

use crate::modules::users::crud::UserCrud;
use crate::modules::users::model::{Preferences, Role, User};
use crate::services::{hashing, jwt::JwtService};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("User account is deactivated")]
    AccountDeactivated,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub struct LoginResult {
    pub user: User,
    pub token: String,
}

pub struct AuthCrud<'a> {
    pool: Pool<MySql>,
    jwt_service: &'a JwtService,
}

impl<'a> AuthCrud<'a> {
    pub fn new(pool: Pool<MySql>, jwt_service: &'a JwtService) -> Self {
        Self { pool, jwt_service }
    }

    /// Create a client account. The role is fixed here; callers cannot
    /// register themselves as staff or admin.
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        phone: &str,
    ) -> Result<LoginResult, AuthError> {
        let users = UserCrud::new(self.pool.clone());

        if users.email_exists(email).await? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash =
            hashing::hash_password(password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password_hash,
            phone: phone.to_string(),
            role: Role::Client,
            is_active: true,
            is_email_verified: false,
            email_verification_token: Some(generate_token()),
            email_verification_expires: Some(now + Duration::hours(24)),
            reset_password_token: None,
            reset_password_expires: None,
            preferences: Json(Preferences::default()),
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = users.create(&user).await {
            // Unique email index may still fire under concurrent registration.
            if e.to_string().contains("Duplicate entry") {
                return Err(AuthError::EmailAlreadyExists);
            }
            return Err(e.into());
        }

        let token = self.jwt_service.create_token(&user.id, user.role)?;
        Ok(LoginResult { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let users = UserCrud::new(self.pool.clone());

        let user = users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        users.touch_last_login(&user.id).await?;

        let token = self.jwt_service.create_token(&user.id, user.role)?;
        Ok(LoginResult { user, token })
    }
}

/// Opaque hex token for email verification / password reset links.
fn generate_token() -> String {
    let bytes: [u8; 20] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
