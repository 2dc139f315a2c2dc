use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::modules::users::crud::UserCrud;
use crate::modules::users::model::Role;
use crate::modules::users::schema::{SingleUserResponse, UserListResponse, UserResponse};
use crate::services::auth::AuthUser;
use crate::AppState;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserListResponse>, ApiError> {
    auth.require_role(&[Role::Admin])?;

    let users = UserCrud::new(state.db.clone()).find_all().await?;
    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(UserListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SingleUserResponse>, ApiError> {
    auth.require_role(&[Role::Admin])?;

    let user = UserCrud::new(state.db.clone())
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))?;

    Ok(Json(SingleUserResponse {
        success: true,
        data: user.into(),
    }))
}
