use crate::fixtures::{seed::PASSWORD, test_app::{ADMIN_EMAIL, TestApp}};
use serde_json::Value;

#[tokio::test]
async fn register_normalizes_email_and_defaults_to_member() {
    let app = TestApp::spawn().await;

    let user = app.register_user("Alice@Example.COM", "alice", None).await;
    assert_eq!(user.email, "alice@example.com");

    let resp = app.auth_get("/api/auth/me", &user.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["role"], "member");
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
async fn admin_role_comes_only_from_configured_emails() {
    let app = TestApp::spawn().await;

    let root = app.register_user(ADMIN_EMAIL, "root", Some("member")).await;
    let me: Value = app
        .auth_get("/api/auth/me", &root.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "admin");

    let sneaky = app.register_user("sneaky@example.com", "sneaky", Some("admin")).await;
    let me: Value = app
        .auth_get("/api/auth/me", &sneaky.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "member");
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = TestApp::spawn().await;
    app.register_user("dup@example.com", "dup1", None).await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "DUP@example.com",
            "username": "dup2",
            "display_name": "Dup",
            "password": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn invalid_registration_payload_is_rejected() {
    let app = TestApp::spawn().await;
    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "username": "x1",
            "display_name": "X",
            "password": "short",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn login_and_refresh_issue_new_tokens() {
    let app = TestApp::spawn().await;
    let user = app.register_user("carol@example.com", "carol", None).await;

    let logged_in = app.login_user("carol@example.com", PASSWORD).await;
    assert_eq!(logged_in.id, user.id);

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": logged_in.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // An access token is not accepted as a refresh token
    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": logged_in.access_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn wrong_password_and_missing_token_are_unauthorized() {
    let app = TestApp::spawn().await;
    app.register_user("dave@example.com", "dave", None).await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({ "email": "dave@example.com", "password": "nope-nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = reqwest::Client::new()
        .get(app.url("/api/organization"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn token_of_removed_user_is_unauthorized() {
    let app = TestApp::spawn().await;
    let user = app.register_user("gone@example.com", "gone", None).await;

    app.db
        .collection::<bson::Document>("users")
        .delete_one(bson::doc! { "email": "gone@example.com" })
        .await
        .unwrap();

    let resp = app.auth_get("/api/auth/me", &user.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Authentication required");
}
