use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::modules::auth::crud::{AuthCrud, AuthError};
use crate::modules::auth::schema::{LoginRequest, MeResponse, RegisterRequest, TokenResponse};
use crate::services::auth::AuthUser;
use crate::modules::users::crud::UserCrud;
use crate::AppState;

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AuthError::AccountDeactivated => ApiError::Unauthorized(e.to_string()),
            AuthError::EmailAlreadyExists => ApiError::BadRequest(e.to_string()),
            AuthError::Database(err) => ApiError::Database(err),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    req.validate()?;

    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    let result = crud
        .register(&req.first_name, &req.last_name, &req.email, &req.password, &req.phone)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            success: true,
            token: result.token,
            user: result.user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    let result = crud.login(&req.email, &req.password).await?;

    Ok(Json(TokenResponse {
        success: true,
        token: result.token,
        user: result.user.into(),
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = UserCrud::new(state.db.clone())
        .find_by_id(&auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))?;

    Ok(Json(MeResponse {
        success: true,
        data: user.into(),
    }))
}
