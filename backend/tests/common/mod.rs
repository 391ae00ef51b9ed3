//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory user store, so these tests run
//! without PostgreSQL.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use coursebook_backend::{
    auth::HashParams, config::AppConfig, repositories::InMemoryUserStore, routes, state::AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-32chars";

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let state = AppState::new(users.clone(), config).unwrap();
        let app = routes::create_router(state.clone());

        Self { app, state, users }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        self.send(Request::builder().method("GET").uri(path), Body::empty())
            .await
    }

    /// Make a GET request with an Authorization header
    pub async fn get_with_auth(&self, path: &str, authorization: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .method("GET")
                .uri(path)
                .header("Authorization", authorization),
            Body::empty(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("Content-Type", "application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    /// Sign up and return the parsed response body
    pub async fn sign_up(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let body = json!({ "email": email, "password": password });
        let (status, response) = self.post("/v1/public/signup", &body.to_string()).await;
        (status, serde_json::from_str(&response).unwrap())
    }

    /// Sign in and return the parsed response body
    pub async fn sign_in(&self, email: &str, password: &str) -> (StatusCode, Value) {
        let body = json!({ "email": email, "password": password });
        let (status, response) = self.post("/v1/public/signin", &body.to_string()).await;
        (status, serde_json::from_str(&response).unwrap())
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Body) -> (StatusCode, String) {
        let request = builder.body(body).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();

        (status, body_str)
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.jwt.secret = TEST_SECRET.to_string();
    // Cheap parameters keep the suite fast
    config.password = HashParams::new(256, 1, 1, 16, 32);
    config
}
