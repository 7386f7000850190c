//! User Handlers

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::UpdateUserRequest;
use crate::application::dto::response::{PublicUserResponse, UserResponse};
use crate::application::services::avatar_paths;
use crate::presentation::middleware::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Get current authenticated user
pub async fn get_current_user(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Update current user profile
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    body.validate()?;

    let updated = state.users.update_profile(&user, body).await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Get another user's public profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<PublicUserResponse>, AppError> {
    let user = state.users.get_public_profile(user_id).await?;

    Ok(Json(PublicUserResponse::from(user)))
}

/// Stock avatar paths
pub async fn list_avatars() -> Json<Vec<String>> {
    Json(avatar_paths())
}
