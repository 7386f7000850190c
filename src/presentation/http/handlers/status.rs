//! Presence Handlers

use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::application::dto::response::FriendStatusListResponse;
use crate::domain::StatusSnapshot;
use crate::presentation::middleware::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn friends_statuses(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<FriendStatusListResponse>, AppError> {
    let statuses = state.status.get_initial_friend_statuses(user.id).await?;

    Ok(Json(FriendStatusListResponse { statuses }))
}

/// Friends that are not offline
pub async fn online_friends(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<FriendStatusListResponse>, AppError> {
    let statuses = state
        .status
        .get_initial_friend_statuses(user.id)
        .await?
        .into_iter()
        .filter(|s| s.status.is_available())
        .collect();

    Ok(Json(FriendStatusListResponse { statuses }))
}

pub async fn my_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<StatusSnapshot> {
    Json(state.status.get_my_status(user.id))
}

/// A friend's status
pub async fn user_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
) -> Result<Json<StatusSnapshot>, AppError> {
    let status = state.status.get_user_status(user.id, user_id).await?;

    Ok(Json(status))
}
