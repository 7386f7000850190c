//! Authentication and profile API tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{unique_nickname, TestApp};

#[tokio::test]
async fn test_register_with_valid_data() {
    let app = TestApp::new();
    let nickname = unique_nickname();

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": format!("{}@example.com", nickname),
            "password": "abc",
            "nickname": nickname,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["nickname"], nickname);
    assert_eq!(body["is_active"], true);
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    let existing = app.create_user().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": existing.email,
            "password": "abcdef",
            "nickname": unique_nickname(),
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["message"], "Email already registered");
}

#[tokio::test]
async fn test_register_duplicate_nickname() {
    let app = TestApp::new();
    let existing = app.create_user().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "someone.else@example.com",
            "password": "abcdef",
            "nickname": existing.nickname,
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["message"], "Nickname already taken");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "ab", "nickname": "xy" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].get("email").is_some());
    assert!(body["details"].get("password").is_some());
    assert!(body["details"].get("nickname").is_some());
}

#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let app = TestApp::new();
    let user = app.create_user().await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": user.email, "password": user.password }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);

    let cookie = response.cookie("l2p_auth");
    assert_eq!(cookie.value(), body["access_token"].as_str().unwrap());
    assert_eq!(cookie.http_only(), Some(true));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new();
    let user = app.create_user().await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": user.email, "password": "wrong" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();

    let response = app.server.post("/auth/logout").await;

    response.assert_status(StatusCode::NO_CONTENT);
    let set_cookie = response.header("set-cookie");
    let set_cookie = set_cookie.to_str().unwrap();
    assert!(set_cookie.starts_with("l2p_auth=;"));
    assert!(set_cookie.contains("Max-Age=0"));
    assert!(set_cookie.contains("Path=/"));
}

#[tokio::test]
async fn test_logout_with_bearer_clears_cookie() {
    let app = TestApp::new();
    let user = app.create_user().await;

    let response = app
        .server
        .post("/auth/logout")
        .authorization_bearer(&user.token)
        .await;

    response.assert_status(StatusCode::NO_CONTENT);
    let cookie = response.cookie("l2p_auth");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age().map(|age| age.whole_seconds()), Some(0));
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new();

    app.server
        .get("/users/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/users/me")
        .authorization_bearer("not.a.jwt")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_bearer_and_cookie() {
    let app = TestApp::new();
    let user = app.create_user().await;

    let by_header: Value = app
        .server
        .get("/users/me")
        .authorization_bearer(&user.token)
        .await
        .json();
    assert_eq!(by_header["id"], user.id);
    assert_eq!(by_header["email"], user.email);

    let login = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": user.email, "password": user.password }))
        .await;
    let response = app
        .server
        .get("/users/me")
        .add_cookie(login.cookie("l2p_auth"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["id"], user.id);
}

#[tokio::test]
async fn test_deactivated_user_is_rejected() {
    let app = TestApp::new();
    let user = app.create_user().await;
    app.db.set_active(user.id, false);

    app.server
        .get("/users/me")
        .authorization_bearer(&user.token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    let user = app.create_user().await;
    let other = app.create_user().await;

    let conflict = app
        .server
        .patch("/users/me")
        .authorization_bearer(&user.token)
        .json(&json!({ "nickname": other.nickname }))
        .await;
    conflict.assert_status(StatusCode::CONFLICT);

    let updated: Value = app
        .server
        .patch("/users/me")
        .authorization_bearer(&user.token)
        .json(&json!({ "description": "plays ludo", "pfp_path": "/images/avatar/3.png" }))
        .await
        .json();
    assert_eq!(updated["description"], "plays ludo");
    assert_eq!(updated["pfp_path"], "/images/avatar/3.png");
    assert_eq!(updated["nickname"], user.nickname);
}

#[tokio::test]
async fn test_public_profile_hides_email() {
    let app = TestApp::new();
    let viewer = app.create_user().await;
    let target = app.create_user().await;

    let profile: Value = app
        .server
        .get(&format!("/users/{}", target.id))
        .authorization_bearer(&viewer.token)
        .await
        .json();

    assert_eq!(profile["nickname"], target.nickname);
    assert!(profile.get("email").is_none());

    app.server
        .get("/users/999999")
        .authorization_bearer(&viewer.token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_avatar_list() {
    let app = TestApp::new();

    let avatars: Vec<String> = app.server.get("/avatars").await.json();

    assert_eq!(avatars.len(), 16);
    assert_eq!(avatars[0], "/images/avatar/1.png");
    assert_eq!(avatars[15], "/images/avatar/16.png");
}
