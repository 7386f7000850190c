//! Lobby Handlers
//!
//! Lobby codes in paths are case-insensitive.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    CreateLobbyRequest, LobbySettingsRequest, TransferHostRequest,
};
use crate::application::dto::response::{LobbyCreatedResponse, LobbyJoinedResponse, LobbyResponse};
use crate::presentation::middleware::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Open a lobby hosted by the caller
pub async fn create_lobby(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Option<Json<CreateLobbyRequest>>,
) -> Result<(StatusCode, Json<LobbyCreatedResponse>), AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let lobby = state.lobbies.create_lobby(&user, body.max_players).await?;

    Ok((
        StatusCode::CREATED,
        Json(LobbyCreatedResponse {
            lobby_code: lobby.lobby_code,
            message: "Lobby created successfully",
        }),
    ))
}

pub async fn get_lobby(
    State(state): State<AppState>,
    Path(lobby_code): Path<String>,
) -> Result<Json<LobbyResponse>, AppError> {
    let lobby = state
        .lobbies
        .get_lobby(&lobby_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Lobby not found".into()))?;

    Ok(Json(LobbyResponse::from(lobby)))
}

pub async fn join_lobby(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lobby_code): Path<String>,
) -> Result<Json<LobbyJoinedResponse>, AppError> {
    let lobby = state.lobbies.join_lobby(&lobby_code, &user).await?;

    Ok(Json(LobbyJoinedResponse {
        lobby: LobbyResponse::from(lobby),
        message: "Joined lobby successfully",
    }))
}

pub async fn leave_lobby(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lobby_code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.lobbies.leave_lobby(&lobby_code, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Change the player limit (host only)
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lobby_code): Path<String>,
    Json(body): Json<LobbySettingsRequest>,
) -> Result<Json<LobbyResponse>, AppError> {
    let lobby = state
        .lobbies
        .update_lobby_settings(&lobby_code, user.id, body.max_players)
        .await?;

    Ok(Json(LobbyResponse::from(lobby)))
}

/// Hand the host role to another member (host only)
pub async fn transfer_host(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lobby_code): Path<String>,
    Json(body): Json<TransferHostRequest>,
) -> Result<Json<LobbyResponse>, AppError> {
    let lobby = state
        .lobbies
        .transfer_host(&lobby_code, user.id, body.new_host_id)
        .await?;

    Ok(Json(LobbyResponse::from(lobby)))
}

/// The lobby the caller sits in
pub async fn my_lobby(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<LobbyResponse>, AppError> {
    let lobby = state
        .lobbies
        .get_user_lobby(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("You are not in a lobby".into()))?;

    Ok(Json(LobbyResponse::from(lobby)))
}
