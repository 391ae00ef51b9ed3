//! Integration tests for sign-up, sign-in and the auth gate

mod common;

use axum::http::StatusCode;
use coursebook_backend::repositories::UserStore;
use fake::{faker::internet::en::SafeEmail, Fake};
use serde_json::json;

fn random_email() -> String {
    SafeEmail().fake()
}

#[tokio::test]
async fn test_sign_up_success() {
    let app = common::TestApp::new();
    let email = random_email();

    let (status, response) = app.sign_up(&email, "SecurePassword123!").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!response["token"].as_str().unwrap().is_empty());
    assert_eq!(response["token_type"], "Bearer");
    assert_eq!(app.users.len().await, 1);
}

#[tokio::test]
async fn test_sign_up_stores_argon2id_hash() {
    let app = common::TestApp::new();
    let email = random_email();
    app.sign_up(&email, "SecurePassword123!").await;

    let record = app.users.find_by_email(&email).await.unwrap().unwrap();
    assert!(record.password_hash.starts_with("$argon2id$v=19$"));
    assert_eq!(record.password_hash.split('$').count(), 6);
}

#[tokio::test]
async fn test_sign_up_duplicate_email() {
    let app = common::TestApp::new();
    let email = random_email();

    let (status, _) = app.sign_up(&email, "SecurePassword123!").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, response) = app.sign_up(&email, "AnotherPassword!").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_sign_up_invalid_input() {
    let app = common::TestApp::new();

    let (status, _) = app.sign_up("not-an-email", "SecurePassword123!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.sign_up(&random_email(), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.users.is_empty().await);
}

#[tokio::test]
async fn test_sign_in_success() {
    let app = common::TestApp::new();
    let email = random_email();
    let (_, signed_up) = app.sign_up(&email, "SecurePassword123!").await;

    let (status, response) = app.sign_in(&email, "SecurePassword123!").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["user_id"], signed_up["user_id"]);
}

#[tokio::test]
async fn test_sign_in_failures_are_indistinguishable() {
    let app = common::TestApp::new();
    let email = random_email();
    app.sign_up(&email, "SecurePassword123!").await;

    let (wrong_status, wrong_body) = app.sign_in(&email, "WrongPassword!").await;
    let (unknown_status, unknown_body) = app.sign_in(&random_email(), "WrongPassword!").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_malformed_body_rejected_before_gate_concerns() {
    let app = common::TestApp::new();

    let (status, _) = app
        .post("/v1/public/signin", &json!({ "email": "a@example.com" }).to_string())
        .await;

    assert!(status.is_client_error());
    assert_ne!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_issued_token() {
    let app = common::TestApp::new();
    let email = random_email();
    let (_, signed_up) = app.sign_up(&email, "SecurePassword123!").await;
    let token = signed_up["token"].as_str().unwrap();

    let (status, body) = app.get_with_auth("/v1/me", &format!("Bearer {}", token)).await;

    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["user_id"], signed_up["user_id"]);
    assert_eq!(body["email"], email);
}

#[tokio::test]
async fn test_me_without_token() {
    let app = common::TestApp::new();

    let (status, body) = app.get("/v1/me").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Unauthorized"));
}

#[tokio::test]
async fn test_me_rejects_bad_header_shapes() {
    let app = common::TestApp::new();
    let (_, signed_up) = app.sign_up(&random_email(), "SecurePassword123!").await;
    let token = signed_up["token"].as_str().unwrap();

    for header in [
        format!("Basic {}", token),
        format!("Bearer {} {}", token, token),
        format!("Bearer Bearer {}", token),
        format!("Token Bearer {}", token),
        "Bearer".to_string(),
    ] {
        let (status, _) = app.get_with_auth("/v1/me", &header).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", header);
    }
}

#[tokio::test]
async fn test_token_from_other_deployment_rejected() {
    let app = common::TestApp::new();
    let mut other_config = common::test_config();
    other_config.jwt.secret = "a-completely-different-signing-secret".to_string();
    let other = common::TestApp::with_config(other_config);

    let (_, signed_up) = other.sign_up(&random_email(), "SecurePassword123!").await;
    let token = signed_up["token"].as_str().unwrap();

    let (status, _) = app.get_with_auth("/v1/me", &format!("Bearer {}", token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
