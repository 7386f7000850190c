//! Chat API tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use l2p_backend::application::services::ChatService;
use l2p_backend::shared::error::AppError;

use crate::common::{TestApp, TEST_BUCKET};

#[tokio::test]
async fn test_upload_url_requires_friendship() {
    let app = TestApp::new();
    let alice = app.create_user().await;
    let bob = app.create_user().await;

    let response = app
        .server
        .post("/chat/get-upload-url")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "friend_user_id": bob.id,
            "filename": "cat.png",
            "content_type": "image/png"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["message"],
        "You must be friends with this user to chat"
    );
}

#[tokio::test]
async fn test_upload_url_rejects_content_type() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let response = app
        .server
        .post("/chat/get-upload-url")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "friend_user_id": bob.id,
            "filename": "notes.pdf",
            "content_type": "application/pdf"
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["details"]["content_type"], "application/pdf");
    assert_eq!(body["details"]["allowed"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_upload_url_for_friend() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let response = app
        .server
        .post("/chat/get-upload-url")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "friend_user_id": bob.id,
            "filename": "holiday photo.JPG",
            "content_type": "image/jpeg"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let object_name = body["object_name"].as_str().unwrap();
    let image_path = body["image_path"].as_str().unwrap();

    assert!(object_name.starts_with("chat-images/"));
    assert_eq!(image_path, format!("{}/{}", TEST_BUCKET, object_name));
    assert!(body["upload_url"].as_str().unwrap().contains("op=put&ttl=900"));
    assert_eq!(body["expires_in_minutes"], 15);
}

#[tokio::test]
async fn test_upload_url_requires_filename() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    app.server
        .post("/chat/get-upload-url")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "friend_user_id": bob.id,
            "filename": "",
            "content_type": "image/png"
        }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_history_pagination() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let first = app.send_message(&alice, &bob, "one").await;
    let second = app.send_message(&bob, &alice, "two").await;
    let third = app.send_message(&alice, &bob, "three").await;

    let page: Value = app
        .server
        .get(&format!("/chat/history/{}", bob.id))
        .authorization_bearer(&alice.token)
        .add_query_param("limit", 2)
        .await
        .json();

    assert_eq!(page["total"], 3);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["has_more"], true);
    assert_eq!(page["next_cursor"], second);
    assert_eq!(page["friend_user_id"], bob.id);
    assert_eq!(page["friend_nickname"], bob.nickname);
    assert_eq!(page["messages"][0]["id"], third);
    assert_eq!(page["messages"][0]["is_mine"], true);
    assert_eq!(page["messages"][1]["content"], "two");
    assert_eq!(page["messages"][1]["is_mine"], false);
    assert_eq!(page["messages"][1]["sender_nickname"], bob.nickname);

    let older: Value = app
        .server
        .get(&format!("/chat/history/{}", bob.id))
        .authorization_bearer(&alice.token)
        .add_query_param("limit", 2)
        .add_query_param("before_message_id", second)
        .await
        .json();

    assert_eq!(older["messages"].as_array().unwrap().len(), 1);
    assert_eq!(older["messages"][0]["id"], first);
    assert_eq!(older["has_more"], false);
    assert_eq!(older["next_cursor"], Value::Null);
}

#[tokio::test]
async fn test_history_limit_bounds() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    for limit in [0, 101] {
        app.server
            .get(&format!("/chat/history/{}", bob.id))
            .authorization_bearer(&alice.token)
            .add_query_param("limit", limit)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_history_with_unknown_user() {
    let app = TestApp::new();
    let alice = app.create_user().await;

    let response = app
        .server
        .get("/chat/history/999999")
        .authorization_bearer(&alice.token)
        .await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["message"], "One or both users not found");
}

#[tokio::test]
async fn test_conversations_newest_first() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;
    let carol = app.create_user().await;
    let dave = app.create_user().await;

    for friend in [&carol, &dave] {
        app.server
            .post("/friends/request")
            .authorization_bearer(&alice.token)
            .json(&json!({ "friend_user_id": friend.id }))
            .await
            .assert_status(StatusCode::CREATED);
        app.server
            .post("/friends/accept")
            .authorization_bearer(&friend.token)
            .json(&json!({ "friend_user_id": alice.id }))
            .await
            .assert_status_ok();
    }

    app.send_message(&alice, &bob, "hi bob").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    app.send_message(&carol, &alice, "hi alice").await;

    let body: Value = app
        .server
        .get("/chat/conversations")
        .authorization_bearer(&alice.token)
        .await
        .json();
    let conversations = body["conversations"].as_array().unwrap();

    assert_eq!(conversations.len(), 3);
    assert_eq!(conversations[0]["friend_id"], carol.id);
    assert_eq!(conversations[0]["last_message_content"], "hi alice");
    assert_eq!(conversations[0]["last_message_is_mine"], false);
    assert_eq!(conversations[1]["friend_id"], bob.id);
    assert_eq!(conversations[1]["last_message_is_mine"], true);
    assert_eq!(conversations[2]["friend_id"], dave.id);
    assert_eq!(conversations[2]["last_message_time"], Value::Null);
    assert_eq!(conversations[2]["unread_count"], 0);
}

#[tokio::test]
async fn test_image_message_requires_uploaded_object() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let upload: Value = app
        .server
        .post("/chat/get-upload-url")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "friend_user_id": bob.id,
            "filename": "cat.png",
            "content_type": "image/png"
        }))
        .await
        .json();
    let image_path = upload["image_path"].as_str().unwrap().to_string();

    let missing = app
        .state
        .chat
        .process_send_message(alice.id, bob.id, None, Some(image_path.clone()))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    app.storage.put(upload["object_name"].as_str().unwrap());
    let sent = app
        .state
        .chat
        .process_send_message(alice.id, bob.id, None, Some(image_path))
        .await
        .unwrap();

    assert!(sent.image_url.unwrap().contains("op=get"));
    assert_eq!(app.db.message_count(), 1);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let result = app
        .state
        .chat
        .process_send_message(alice.id, bob.id, Some(String::new()), None)
        .await;

    assert!(
        matches!(result, Err(AppError::BadRequest(msg)) if msg == "Either content or image must be provided")
    );
    assert_eq!(app.db.message_count(), 0);
}

#[tokio::test]
async fn test_image_path_with_relative_segments_is_rejected() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let result = app
        .state
        .chat
        .process_send_message(
            alice.id,
            bob.id,
            None,
            Some(format!("{}/chat-images/1/../../x.png", TEST_BUCKET)),
        )
        .await;

    assert!(
        matches!(result, Err(AppError::Validation { message, .. }) if message == "Invalid image_path format")
    );
    assert_eq!(app.db.message_count(), 0);
}

#[tokio::test]
async fn test_oversized_image_is_removed_from_storage() {
    let app = TestApp::new();
    let (alice, bob) = app.create_friends().await;

    let upload: Value = app
        .server
        .post("/chat/get-upload-url")
        .authorization_bearer(&alice.token)
        .json(&json!({
            "friend_user_id": bob.id,
            "filename": "huge.png",
            "content_type": "image/png"
        }))
        .await
        .json();
    let object_name = upload["object_name"].as_str().unwrap();
    let max_size = app.state.settings.uploads.max_image_size;
    app.storage.put_sized(object_name, max_size + 1);

    let result = app
        .state
        .chat
        .process_send_message(
            alice.id,
            bob.id,
            None,
            Some(upload["image_path"].as_str().unwrap().to_string()),
        )
        .await;

    assert!(
        matches!(result, Err(AppError::Validation { message, .. }) if message == "Image exceeds maximum size")
    );
    assert!(!app.storage.contains(object_name));
    assert_eq!(app.db.message_count(), 0);
}
