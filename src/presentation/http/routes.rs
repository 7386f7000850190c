//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, create_cors_layer, create_trace_layer, track_metrics};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let cors = create_cors_layer(&state.settings.cors);

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes(state.clone()))
        .nest("/friends", friend_routes(state.clone()))
        .nest("/chat", chat_routes(state.clone()))
        .nest("/status", status_routes(state.clone()))
        .nest("/guest", guest_routes())
        .nest("/lobby", lobby_routes(state.clone()))
        .route("/avatars", get(handlers::user::list_avatars))
        // Authenticates during the upgrade itself
        .route("/ws/chat", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route("/docs", get(handlers::docs::docs_page))
        .route("/docs/routes", get(handlers::docs::list_routes))
        .route_layer(middleware::from_fn(track_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(create_trace_layer())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
}

/// User routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(handlers::user::get_current_user).patch(handlers::user::update_current_user),
        )
        .route("/{user_id}", get(handlers::user::get_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Friendship routes (protected)
fn friend_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::friend::list_friendships))
        .route("/search", get(handlers::friend::search_users))
        .route("/request", post(handlers::friend::send_request))
        .route("/accept", post(handlers::friend::accept_request))
        .route("/{friend_user_id}", delete(handlers::friend::remove_friend))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Chat routes (protected)
fn chat_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/get-upload-url", post(handlers::chat::get_upload_url))
        .route("/history/{friend_user_id}", get(handlers::chat::get_history))
        .route("/conversations", get(handlers::chat::get_conversations))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Presence routes (protected)
fn status_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/friends", get(handlers::status::friends_statuses))
        .route("/friends/online", get(handlers::status::online_friends))
        .route("/me", get(handlers::status::my_status))
        .route("/users/{user_id}", get(handlers::status::user_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Guest routes (public)
fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::guest::create_guest))
        .route("/{guest_id}", get(handlers::guest::get_guest).delete(handlers::guest::delete_guest))
        .route("/{guest_id}/extend", post(handlers::guest::extend_guest))
}

/// Lobby routes (protected)
fn lobby_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::lobby::create_lobby))
        .route("/me/current", get(handlers::lobby::my_lobby))
        .route("/{lobby_code}", get(handlers::lobby::get_lobby))
        .route("/{lobby_code}/join", post(handlers::lobby::join_lobby))
        .route("/{lobby_code}/leave", post(handlers::lobby::leave_lobby))
        .route("/{lobby_code}/settings", patch(handlers::lobby::update_settings))
        .route("/{lobby_code}/transfer-host", post(handlers::lobby::transfer_host))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
