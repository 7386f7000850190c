//! Authentication Middleware
//!
//! Resolves the caller from a Bearer token or the auth cookie.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};

use crate::domain::RegisteredUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated, active user inserted into request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser(pub RegisteredUser);

/// Bearer header first, then the named cookie.
pub fn request_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Authentication middleware for protected routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request_token(request.headers(), &state.settings.auth.cookie_name)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    let user = state.auth.authenticate(&token).await?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
