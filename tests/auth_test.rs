mod common;

use blog_api::config::hashids::USERS_CONNECTION;
use serde_json::Value;

#[tokio::test]
async fn register_and_login() {
    let app = common::spawn_app().await;

    // Register
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["success"].as_bool().unwrap());
    assert!(body["data"]["token"].as_str().is_some());
    let opaque_id = body["data"]["user_id"].as_str().unwrap().to_string();
    assert_eq!(opaque_id.len(), 12);
    assert!(app.hashids.decode_id(USERS_CONNECTION, &opaque_id).is_ok());

    // Login by username
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "username": "alice",
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user_id"], opaque_id);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Login by email
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "username": "alice@example.com",
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Get current user
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["id"], opaque_id);
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_duplicate_email_fails() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "bob2",
            "email": "bob@example.com",
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn register_validates_payload() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "x",
            "email": "not-an-email",
            "password": "short"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn login_bad_credentials_fail() {
    let app = common::spawn_app().await;
    app.client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "password_123"
        }))
        .send()
        .await
        .unwrap();

    for (username, password) in [("carol", "wrong_password"), ("nobody_here", "password_123")] {
        let resp = app
            .client
            .post(app.url("/auth/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401, "{username}");
    }
}

#[tokio::test]
async fn banned_user_is_forbidden() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "dave").await;
    common::set_role(&app.db, user.id, blog_api::models::user::ROLE_BANNED).await;

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn me_requires_token() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth("garbage.token.value")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
