//! Chat Handlers
//!
//! Message sending goes through the gateway; these cover uploads and reads.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use validator::Validate;

use crate::application::dto::request::{ChatHistoryQuery, ConversationsQuery, PresignedUploadRequest};
use crate::application::dto::response::{
    ChatHistoryResponse, PresignedUploadResponse, RecentConversationsResponse,
};
use crate::presentation::middleware::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Presigned PUT URL for a chat image
pub async fn get_upload_url(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<PresignedUploadRequest>,
) -> Result<Json<PresignedUploadResponse>, AppError> {
    body.validate()?;

    let upload = state
        .chat
        .generate_image_upload_url(user.id, body.friend_user_id, &body.filename, &body.content_type)
        .await?;

    Ok(Json(upload))
}

/// Cursor-paginated history with one friend
pub async fn get_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(friend_user_id): Path<i64>,
    Query(query): Query<ChatHistoryQuery>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let history = state
        .chat
        .get_chat_history(user.id, friend_user_id, query.before_message_id, query.limit)
        .await?;

    Ok(Json(history))
}

/// Conversations ordered by latest message
pub async fn get_conversations(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<RecentConversationsResponse>, AppError> {
    let conversations = state
        .chat
        .get_recent_conversations(user.id, query.limit)
        .await?;

    Ok(Json(RecentConversationsResponse { conversations }))
}
