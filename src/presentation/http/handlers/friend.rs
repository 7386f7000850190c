//! Friendship Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::application::dto::request::{FriendUserRequest, FriendshipListQuery, UserSearchQuery};
use crate::application::dto::response::{FriendshipResponse, FriendshipWithUser, UserSearchResponse};
use crate::domain::FriendshipStatus;
use crate::presentation::middleware::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Search active users by nickname
pub async fn search_users(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<UserSearchResponse>, AppError> {
    let results = state
        .friendships
        .search_users(&query.q, user.id, query.page_params())
        .await?;

    Ok(Json(results))
}

/// Send a friend request
pub async fn send_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<FriendUserRequest>,
) -> Result<(StatusCode, Json<FriendshipResponse>), AppError> {
    let friendship = state
        .friendships
        .send_friend_request(&user, body.friend_user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(FriendshipResponse::from(friendship))))
}

/// Accept a pending friend request
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<FriendUserRequest>,
) -> Result<Json<FriendshipResponse>, AppError> {
    let friendship = state
        .friendships
        .accept_friend_request(&user, body.friend_user_id)
        .await?;

    Ok(Json(FriendshipResponse::from(friendship)))
}

/// Remove a friend or reject a pending request
pub async fn remove_friend(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(friend_user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .friendships
        .remove_friendship(user.id, friend_user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's friendships, optionally by status
pub async fn list_friendships(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<FriendshipListQuery>,
) -> Result<Json<Vec<FriendshipWithUser>>, AppError> {
    let status = match query.status_filter.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(FriendshipStatus::parse(raw).ok_or_else(|| {
            AppError::validation_with(
                "Invalid status filter",
                json!({ "status_filter": raw }),
            )
        })?),
    };

    let friendships = state
        .friendships
        .get_user_friendships(user.id, status)
        .await?;

    Ok(Json(friendships))
}
