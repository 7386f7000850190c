//! Realtime gateway tests over a real socket

use std::time::Duration;

use axum_test::TestWebSocket;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{TestApp, TestUser};

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

async fn next_frame(ws: &mut TestWebSocket) -> Value {
    tokio::time::timeout(FRAME_TIMEOUT, ws.receive_json::<Value>())
        .await
        .expect("gateway frame in time")
}

/// Next dispatch named `name`, skipping anything else.
async fn next_dispatch(ws: &mut TestWebSocket, name: &str) -> Value {
    loop {
        let frame = next_frame(ws).await;
        if frame["op"] == 0 && frame["t"] == name {
            return frame;
        }
    }
}

/// Heartbeat and wait for the ack. Frames are handled in order, so every
/// command sent before has been processed once the ack arrives.
async fn heartbeat(ws: &mut TestWebSocket) {
    ws.send_json(&json!({ "op": 1 })).await;
    loop {
        if next_frame(ws).await["op"] == 11 {
            return;
        }
    }
}

/// Open a session with `?token=` and read HELLO and READY.
async fn open(app: &TestApp, user: &TestUser) -> TestWebSocket {
    let mut ws = app
        .server
        .get_websocket("/ws/chat")
        .add_query_param("token", &user.token)
        .await
        .into_websocket()
        .await;

    assert_eq!(next_frame(&mut ws).await["op"], 10);
    assert_eq!(next_frame(&mut ws).await["t"], "READY");
    ws
}

/// Open a session that is registered with the gateway.
async fn connect(app: &TestApp, user: &TestUser) -> TestWebSocket {
    let mut ws = open(app, user).await;
    heartbeat(&mut ws).await;
    ws
}

#[tokio::test]
async fn test_upgrade_without_token_is_refused() {
    let app = TestApp::with_http_transport();

    let response = app.server.get_websocket("/ws/chat").await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["message"], "Not authenticated");
}

#[tokio::test]
async fn test_upgrade_with_invalid_token_is_refused() {
    let app = TestApp::with_http_transport();

    app.server
        .get_websocket("/ws/chat")
        .add_query_param("token", "not-a-jwt")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_hello_then_ready() {
    let app = TestApp::with_http_transport();
    let user = app.create_user().await;

    let mut ws = app
        .server
        .get_websocket("/ws/chat")
        .add_query_param("token", &user.token)
        .await
        .into_websocket()
        .await;

    let hello = next_frame(&mut ws).await;
    assert_eq!(hello, json!({ "op": 10, "d": { "heartbeat_interval": 25000 } }));

    let ready = next_frame(&mut ws).await;
    assert_eq!(ready["op"], 0);
    assert_eq!(ready["t"], "READY");
    assert_eq!(ready["s"], 1);
    assert_eq!(ready["d"]["user"]["id"], user.id);
    assert!(ready["d"]["session_id"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_cookie_token_connects() {
    let app = TestApp::with_http_transport();
    let user = app.create_user().await;
    let login = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": user.email, "password": user.password }))
        .await;

    let mut ws = app
        .server
        .get_websocket("/ws/chat")
        .add_cookie(login.cookie("l2p_auth"))
        .await
        .into_websocket()
        .await;

    assert_eq!(next_frame(&mut ws).await["op"], 10);
    let ready = next_frame(&mut ws).await;
    assert_eq!(ready["d"]["user"]["nickname"], user.nickname.as_str());

    heartbeat(&mut ws).await;
    assert!(app.state.gateway.is_user_online(user.id));
}

#[tokio::test]
async fn test_message_reaches_every_sender_session_and_the_recipient() {
    let app = TestApp::with_http_transport();
    let (alice, bob) = app.create_friends().await;

    let mut alice_one = connect(&app, &alice).await;
    let mut alice_two = connect(&app, &alice).await;
    let mut bob_ws = connect(&app, &bob).await;

    alice_one
        .send_json(&json!({ "op": 2, "d": { "friend_user_id": bob.id, "content": "gg" } }))
        .await;

    for ws in [&mut alice_one, &mut alice_two] {
        let message = next_dispatch(ws, "MESSAGE").await;
        assert_eq!(message["d"]["content"], "gg");
        assert_eq!(message["d"]["sender_id"], alice.id);
        assert_eq!(message["d"]["is_mine"], true);

        let update = next_dispatch(ws, "CONVERSATION_UPDATED").await;
        assert_eq!(update["d"]["friend_id"], bob.id);
        assert_eq!(update["d"]["last_message_content"], "gg");
        assert_eq!(update["d"]["last_message_is_mine"], true);
    }

    let message = next_dispatch(&mut bob_ws, "MESSAGE").await;
    assert_eq!(message["d"]["content"], "gg");
    assert_eq!(message["d"]["is_mine"], false);

    let update = next_dispatch(&mut bob_ws, "CONVERSATION_UPDATED").await;
    assert_eq!(update["d"]["friend_id"], alice.id);
    assert_eq!(update["d"]["last_message_is_mine"], false);

    assert_eq!(app.db.message_count(), 1);
}

#[tokio::test]
async fn test_rejected_message_reports_error_and_keeps_socket_open() {
    let app = TestApp::with_http_transport();
    let alice = app.create_user().await;
    let stranger = app.create_user().await;
    let mut ws = connect(&app, &alice).await;

    ws.send_json(&json!({ "op": 2, "d": { "friend_user_id": stranger.id, "content": "hi" } }))
        .await;
    let error = next_dispatch(&mut ws, "ERROR").await;
    assert_eq!(
        error["d"],
        json!({ "message": "You must be friends with this user to chat" })
    );

    ws.send_json(&json!({ "op": 2, "d": { "content": "no recipient" } }))
        .await;
    let error = next_dispatch(&mut ws, "ERROR").await;
    assert_eq!(error["d"]["message"], "Invalid message payload");

    heartbeat(&mut ws).await;
    assert_eq!(app.db.message_count(), 0);
}

#[tokio::test]
async fn test_typing_reaches_only_an_online_friend() {
    let app = TestApp::with_http_transport();
    let (alice, bob) = app.create_friends().await;
    let mut alice_ws = connect(&app, &alice).await;

    // Bob is offline, so nothing is queued for him
    alice_ws
        .send_json(&json!({ "op": 3, "d": { "friend_user_id": bob.id } }))
        .await;
    heartbeat(&mut alice_ws).await;

    let mut bob_ws = open(&app, &bob).await;
    bob_ws.send_json(&json!({ "op": 1 })).await;
    assert_eq!(next_frame(&mut bob_ws).await, json!({ "op": 11 }));

    alice_ws
        .send_json(&json!({ "op": 3, "d": { "friend_user_id": bob.id } }))
        .await;
    let typing = next_dispatch(&mut bob_ws, "USER_TYPING").await;
    assert_eq!(
        typing["d"],
        json!({ "user_id": alice.id, "nickname": alice.nickname })
    );
}
