//! Endpoint catalogue served at `/docs`.

use axum::{response::Html, Json};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub authenticated: bool,
    pub summary: &'static str,
}

const fn route(
    method: &'static str,
    path: &'static str,
    authenticated: bool,
    summary: &'static str,
) -> RouteDoc {
    RouteDoc {
        method,
        path,
        authenticated,
        summary,
    }
}

/// Every public route of the service
pub const ROUTES: &[RouteDoc] = &[
    route("POST", "/auth/register", false, "Create an account"),
    route("POST", "/auth/login", false, "Obtain a JWT, also set as the l2p_auth cookie"),
    route("POST", "/auth/logout", false, "Clear the auth cookie"),
    route("GET", "/users/me", true, "Own account"),
    route("PATCH", "/users/me", true, "Update own profile"),
    route("GET", "/users/{user_id}", true, "Public profile of an active user"),
    route("GET", "/avatars", false, "Stock avatar paths"),
    route("GET", "/friends", true, "Own friendships, optional ?status_filter=pending|accepted"),
    route("GET", "/friends/search", true, "Search users by nickname (?q=&page=&page_size=)"),
    route("POST", "/friends/request", true, "Send a friend request"),
    route("POST", "/friends/accept", true, "Accept a pending friend request"),
    route("DELETE", "/friends/{friend_user_id}", true, "Remove a friend or reject a request"),
    route("POST", "/chat/get-upload-url", true, "Presigned upload URL for a chat image"),
    route("GET", "/chat/history/{friend_user_id}", true, "Message history (?before_message_id=&limit=)"),
    route("GET", "/chat/conversations", true, "Recent conversations (?limit=)"),
    route("GET", "/status/friends", true, "Status of every friend"),
    route("GET", "/status/friends/online", true, "Friends that are not offline"),
    route("GET", "/status/me", true, "Own status"),
    route("GET", "/status/users/{user_id}", true, "Status of one friend"),
    route("POST", "/guest", false, "Create a guest session"),
    route("GET", "/guest/{guest_id}", false, "Read a guest session"),
    route("POST", "/guest/{guest_id}/extend", false, "Reset the guest session lifetime"),
    route("DELETE", "/guest/{guest_id}", false, "End a guest session"),
    route("POST", "/lobby", true, "Open a lobby (optional max_players, 2-6)"),
    route("GET", "/lobby/me/current", true, "The lobby the caller sits in"),
    route("GET", "/lobby/{lobby_code}", true, "Lobby with its members"),
    route("POST", "/lobby/{lobby_code}/join", true, "Join a lobby"),
    route("POST", "/lobby/{lobby_code}/leave", true, "Leave a lobby"),
    route("PATCH", "/lobby/{lobby_code}/settings", true, "Change max_players (host only)"),
    route("POST", "/lobby/{lobby_code}/transfer-host", true, "Hand over the host role (host only)"),
    route("GET", "/ws/chat", true, "Realtime gateway (?token= or cookie)"),
    route("GET", "/health", false, "Basic health check"),
    route("GET", "/health/live", false, "Liveness probe"),
    route("GET", "/health/ready", false, "Readiness probe"),
    route("GET", "/metrics", false, "Prometheus metrics"),
    route("GET", "/docs", false, "This page"),
    route("GET", "/docs/routes", false, "This catalogue as JSON"),
];

pub async fn list_routes() -> Json<&'static [RouteDoc]> {
    Json(ROUTES)
}

pub async fn docs_page() -> Html<String> {
    Html(render_page(ROUTES))
}

fn render_page(routes: &[RouteDoc]) -> String {
    let rows: String = routes
        .iter()
        .map(|r| {
            format!(
                "<tr><td><code>{}</code></td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
                r.method,
                escape(r.path),
                if r.authenticated { "yes" } else { "" },
                escape(r.summary),
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>L2P-Online API v{version}</title>
<style>
body {{ font-family: Arial, sans-serif; padding: 20px; }}
table {{ border-collapse: collapse; }}
td, th {{ border-bottom: 1px solid #ddd; padding: 6px 12px; text-align: left; }}
</style>
</head>
<body>
<h1>L2P-Online API v{version}</h1>
<p>JSON version: <a href="/docs/routes">/docs/routes</a></p>
<table>
<tr><th>Method</th><th>Path</th><th>Auth</th><th>Description</th></tr>
{rows}</table>
</body>
</html>
"#,
        version = env!("CARGO_PKG_VERSION"),
        rows = rows,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
