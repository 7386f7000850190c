//! Guest Session Handlers
//!
//! Public endpoints; the guest id acts as the bearer secret.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::response::GuestExtendResponse;
use crate::domain::GuestUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Guest session not found".into())
}

pub async fn create_guest(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<GuestUser>), AppError> {
    let guest = state.guests.create_guest_session().await?;

    Ok((StatusCode::CREATED, Json(guest)))
}

pub async fn get_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<Uuid>,
) -> Result<Json<GuestUser>, AppError> {
    let guest = state
        .guests
        .get_guest_session(guest_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(guest))
}

/// Reset the session TTL
pub async fn extend_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<Uuid>,
) -> Result<Json<GuestExtendResponse>, AppError> {
    if !state.guests.extend_guest_session(guest_id).await? {
        return Err(not_found());
    }

    Ok(Json(GuestExtendResponse {
        guest_id: guest_id.to_string(),
        extended: true,
    }))
}

pub async fn delete_guest(
    State(state): State<AppState>,
    Path(guest_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.guests.delete_guest_session(guest_id).await? {
        return Err(not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
