//! Session routes
//!
//! Sign-in and sign-up live under the public prefix so the auth gate lets
//! them through; `/v1/me` sits behind the gate.
//!
//! # Performance Optimizations
//!
//! - Uses pre-computed JWT keys from AppState (no per-request allocation)
//! - Password hashing runs on blocking thread pool (doesn't block async runtime)

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::{SessionResult, SessionService};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use coursebook_shared::types::{IdentityResponse, SessionRequest, SessionResponse};
use secrecy::ExposeSecret;

/// Create session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/public/signin", post(sign_in))
        .route("/v1/public/signup", post(sign_up))
        .route("/v1/me", get(me))
}

/// Register a new user
///
/// POST /v1/public/signup
async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = SessionService::sign_up(
        state.users(),
        state.jwt(),
        state.password_params(),
        &req.email,
        req.password.expose_secret(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(session_response(session))))
}

/// Sign in with email and password
///
/// POST /v1/public/signin
async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = SessionService::sign_in(
        state.users(),
        state.jwt(),
        &req.email,
        req.password.expose_secret(),
    )
    .await?;

    Ok(Json(session_response(session)))
}

/// Identity of the caller
///
/// GET /v1/me
///
/// # Authentication
/// Requires valid Bearer token in Authorization header.
async fn me(State(state): State<AppState>, auth_user: AuthUser) -> ApiResult<Json<IdentityResponse>> {
    let claims = &auth_user.token.claims;
    let (Some(issued_at), Some(expires_at)) = (claims.issued_at(), claims.expires_at()) else {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    };

    let email = state
        .users()
        .find_by_id(auth_user.user_id)
        .await?
        .map(|user| user.email);

    Ok(Json(IdentityResponse {
        user_id: auth_user.user_id,
        email,
        issued_at,
        expires_at,
    }))
}

fn session_response(session: SessionResult) -> SessionResponse {
    SessionResponse {
        token: session.token,
        token_type: "Bearer".to_string(),
        user_id: session.user_id,
        expires_at: session.expires_at,
    }
}
