//! Lobby API tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::common::{TestApp, TestUser};

async fn create_lobby(app: &TestApp, host: &TestUser, body: Value) -> String {
    let response = app
        .server
        .post("/lobby")
        .authorization_bearer(&host.token)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["message"], "Lobby created successfully");
    body["lobby_code"].as_str().expect("lobby code").to_string()
}

async fn join(app: &TestApp, user: &TestUser, code: &str) -> axum_test::TestResponse {
    app.server
        .post(&format!("/lobby/{}/join", code))
        .authorization_bearer(&user.token)
        .await
}

#[tokio::test]
async fn test_lobby_requires_auth() {
    let app = TestApp::new();

    app.server
        .post("/lobby")
        .json(&json!({}))
        .await
        .assert_status_unauthorized();
    app.server
        .get("/lobby/me/current")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_create_and_read_lobby() {
    let app = TestApp::new();
    let host = app.create_user().await;

    let code = create_lobby(&app, &host, json!({ "max_players": 4 })).await;
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    // Codes are matched case-insensitively
    let lobby: Value = app
        .server
        .get(&format!("/lobby/{}", code.to_lowercase()))
        .authorization_bearer(&host.token)
        .await
        .json();

    assert_eq!(lobby["lobby_code"], code.as_str());
    assert_eq!(lobby["host_id"], host.id);
    assert_eq!(lobby["max_players"], 4);
    assert_eq!(lobby["current_players"], 1);
    assert_eq!(lobby["members"][0]["nickname"], host.nickname.as_str());
    assert_eq!(lobby["members"][0]["is_host"], true);
    assert_eq!(app.lobbies.pointer(host.id), Some(code));
}

#[tokio::test]
async fn test_create_without_body_defaults_to_six_players() {
    let app = TestApp::new();
    let host = app.create_user().await;

    let response = app
        .server
        .post("/lobby")
        .authorization_bearer(&host.token)
        .await;
    response.assert_status(StatusCode::CREATED);

    let current: Value = app
        .server
        .get("/lobby/me/current")
        .authorization_bearer(&host.token)
        .await
        .json();
    assert_eq!(current["max_players"], 6);
}

#[tokio::test]
async fn test_create_rejects_invalid_max_players() {
    let app = TestApp::new();
    let host = app.create_user().await;

    let response = app
        .server
        .post("/lobby")
        .authorization_bearer(&host.token)
        .json(&json!({ "max_players": 8 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid max_players");
    assert_eq!(body["details"]["max_players"], 8);
    assert_eq!(app.lobbies.lobby_count(), 0);
}

#[tokio::test]
async fn test_second_lobby_is_refused() {
    let app = TestApp::new();
    let host = app.create_user().await;
    create_lobby(&app, &host, json!({})).await;

    let response = app
        .server
        .post("/lobby")
        .authorization_bearer(&host.token)
        .json(&json!({}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["message"], "You are already in a lobby");
}

#[tokio::test]
async fn test_join_until_full() {
    let app = TestApp::new();
    let host = app.create_user().await;
    let second = app.create_user().await;
    let third = app.create_user().await;
    let code = create_lobby(&app, &host, json!({ "max_players": 2 })).await;

    let joined = join(&app, &second, &code).await;
    joined.assert_status_ok();
    let body: Value = joined.json();
    assert_eq!(body["message"], "Joined lobby successfully");
    assert_eq!(body["lobby"]["current_players"], 2);
    assert_eq!(body["lobby"]["members"][1]["user_id"], second.id);
    assert_eq!(body["lobby"]["members"][1]["is_host"], false);

    let again = join(&app, &second, &code).await;
    again.assert_status_bad_request();
    assert_eq!(again.json::<Value>()["message"], "You are already in this lobby");

    let full = join(&app, &third, &code).await;
    full.assert_status_bad_request();
    assert_eq!(full.json::<Value>()["message"], "Lobby is full");
}

#[tokio::test]
async fn test_join_unknown_lobby() {
    let app = TestApp::new();
    let user = app.create_user().await;

    let response = join(&app, &user, "ZZZZZZ").await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["message"], "Lobby not found");
}

#[tokio::test]
async fn test_join_notifies_members() {
    let app = TestApp::new();
    let host = app.create_user().await;
    let guest = app.create_user().await;
    let code = create_lobby(&app, &host, json!({})).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    app.state
        .gateway
        .register_session("host-session".into(), host.id, tx);

    join(&app, &guest, &code).await.assert_status_ok();

    let frame = rx.try_recv().expect("member joined dispatch");
    assert_eq!(frame.t.as_deref(), Some("LOBBY_MEMBER_JOINED"));
    assert_eq!(
        frame.d,
        Some(json!({ "lobby_code": code, "user_id": guest.id, "nickname": guest.nickname }))
    );
}

#[tokio::test]
async fn test_host_leaving_hands_over_and_last_member_closes() {
    let app = TestApp::new();
    let host = app.create_user().await;
    let guest = app.create_user().await;
    let code = create_lobby(&app, &host, json!({})).await;
    join(&app, &guest, &code).await.assert_status_ok();

    app.server
        .post(&format!("/lobby/{}/leave", code))
        .authorization_bearer(&host.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let lobby: Value = app
        .server
        .get(&format!("/lobby/{}", code))
        .authorization_bearer(&guest.token)
        .await
        .json();
    assert_eq!(lobby["host_id"], guest.id);
    assert_eq!(lobby["current_players"], 1);
    assert_eq!(app.lobbies.pointer(host.id), None);

    app.server
        .get("/lobby/me/current")
        .authorization_bearer(&host.token)
        .await
        .assert_status_not_found();

    app.server
        .post(&format!("/lobby/{}/leave", code))
        .authorization_bearer(&guest.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(app.lobbies.lobby_count(), 0);
    app.server
        .get(&format!("/lobby/{}", code))
        .authorization_bearer(&guest.token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_leave_when_not_a_member() {
    let app = TestApp::new();
    let host = app.create_user().await;
    let stranger = app.create_user().await;
    let code = create_lobby(&app, &host, json!({})).await;

    let response = app
        .server
        .post(&format!("/lobby/{}/leave", code))
        .authorization_bearer(&stranger.token)
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["message"], "You are not in this lobby");
}

#[tokio::test]
async fn test_settings_rules() {
    let app = TestApp::new();
    let host = app.create_user().await;
    let guest = app.create_user().await;
    let code = create_lobby(&app, &host, json!({})).await;
    join(&app, &guest, &code).await.assert_status_ok();
    let path = format!("/lobby/{}/settings", code);

    app.server
        .patch(&path)
        .authorization_bearer(&guest.token)
        .json(&json!({ "max_players": 3 }))
        .await
        .assert_status_forbidden();

    let below = app
        .server
        .patch(&path)
        .authorization_bearer(&host.token)
        .json(&json!({ "max_players": 1 }))
        .await;
    below.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(below.json::<Value>()["message"], "Invalid max_players");

    let updated: Value = app
        .server
        .patch(&path)
        .authorization_bearer(&host.token)
        .json(&json!({ "max_players": 2 }))
        .await
        .json();
    assert_eq!(updated["max_players"], 2);
}

#[tokio::test]
async fn test_settings_cannot_drop_below_players() {
    let app = TestApp::new();
    let host = app.create_user().await;
    let code = create_lobby(&app, &host, json!({})).await;
    for _ in 0..2 {
        let user = app.create_user().await;
        join(&app, &user, &code).await.assert_status_ok();
    }

    let response = app
        .server
        .patch(&format!("/lobby/{}/settings", code))
        .authorization_bearer(&host.token)
        .json(&json!({ "max_players": 2 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["message"], "Cannot set max_players below current player count");
    assert_eq!(body["details"], json!({ "current_players": 3, "requested_max": 2 }));
}

#[tokio::test]
async fn test_transfer_host() {
    let app = TestApp::new();
    let host = app.create_user().await;
    let guest = app.create_user().await;
    let stranger = app.create_user().await;
    let code = create_lobby(&app, &host, json!({})).await;
    join(&app, &guest, &code).await.assert_status_ok();
    let path = format!("/lobby/{}/transfer-host", code);

    let not_member = app
        .server
        .post(&path)
        .authorization_bearer(&host.token)
        .json(&json!({ "new_host_id": stranger.id }))
        .await;
    not_member.assert_status_bad_request();
    assert_eq!(not_member.json::<Value>()["message"], "New host is not in this lobby");

    let lobby: Value = app
        .server
        .post(&path)
        .authorization_bearer(&host.token)
        .json(&json!({ "new_host_id": guest.id }))
        .await
        .json();
    assert_eq!(lobby["host_id"], guest.id);
    assert_eq!(lobby["members"][1]["is_host"], true);

    app.server
        .post(&path)
        .authorization_bearer(&host.token)
        .json(&json!({ "new_host_id": host.id }))
        .await
        .assert_status_forbidden();
}

#[tokio::test]
async fn test_lobby_member_shows_in_lobby_to_friends() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let (tx, _rx) = mpsc::unbounded_channel();
    app.state
        .gateway
        .register_session("bob-session".into(), bob.id, tx);

    let code = create_lobby(&app, &bob, json!({ "max_players": 3 })).await;

    let status: Value = app
        .server
        .get(&format!("/status/users/{}", bob.id))
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(status["status"], "in_lobby");
    assert_eq!(status["lobby_code"], code.as_str());
    assert_eq!(status["lobby_filled_slots"], 1);
    assert_eq!(status["lobby_max_slots"], 3);

    app.server
        .post(&format!("/lobby/{}/leave", code))
        .authorization_bearer(&bob.token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let status: Value = app
        .server
        .get(&format!("/status/users/{}", bob.id))
        .authorization_bearer(&alice.token)
        .await
        .json();
    assert_eq!(status["status"], "online");
    assert!(status.get("lobby_code").is_none());
}
