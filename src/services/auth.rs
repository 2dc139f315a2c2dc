//! JWT bearer authentication extractor for protected handlers.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::modules::users::crud::UserCrud;
use crate::modules::users::model::Role;
use crate::AppState;

/// Authenticated caller, resolved from the `Authorization: Bearer <token>`
/// header. The referenced user must still exist and be active; tokens are
/// otherwise stateless, so there is no early revocation.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl AuthUser {
    /// Authorize against a role allow-list. 403 when the caller's role is
    /// not listed.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You do not have permission to access this route".to_string(),
            ))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("Not authorized to access this route".to_string())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".to_string(),
            )
        })?;

        let claims = state
            .jwt_service
            .verify_token(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?
            .claims;

        // The token is stateless; the user row is the source of truth for
        // existence and the active flag.
        let user = UserCrud::new(state.db.clone())
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized("User account is deactivated".to_string()));
        }

        Ok(AuthUser {
            id: user.id,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: "u-1".to_string(),
            role,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@medbook.com".to_string(),
        }
    }

    #[test]
    fn require_role_accepts_listed_roles() {
        assert!(caller(Role::Admin).require_role(&[Role::Admin]).is_ok());
        assert!(caller(Role::Staff)
            .require_role(&[Role::Staff, Role::Admin])
            .is_ok());
    }

    #[test]
    fn require_role_rejects_unlisted_roles() {
        let err = caller(Role::Client).require_role(&[Role::Admin]).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
