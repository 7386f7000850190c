//! Authentication Handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use crate::application::dto::request::{LoginRequest, RegisterRequest};
use crate::application::dto::response::{TokenResponse, UserResponse};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    body.validate()?;

    let user = state
        .auth
        .register(&body.nickname, &body.email, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login with credentials; the token is returned and set as a cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    body.validate()?;

    let token = state.auth.login(&body.email, &body.password).await?;

    let auth = &state.settings.auth;
    let cookie = Cookie::build((auth.cookie_name.clone(), token.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .build();

    Ok((
        jar.add(cookie),
        Json(TokenResponse::bearer(token.token, token.expires_in)),
    ))
}

/// Clear the auth cookie, whether or not the request carried it
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let auth = &state.settings.auth;
    let mut cookie = Cookie::build((auth.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .build();
    cookie.make_removal();

    (jar.add(cookie), StatusCode::NO_CONTENT)
}
