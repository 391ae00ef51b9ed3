//! Authentication middleware
//!
//! Gates every request except exempted paths. The bearer token is pulled
//! from the `Authorization` header, verified, and the resulting identity is
//! attached to the request as an [`AuthUser`] for downstream handlers.
//!
//! Rejections always carry the same 401 body; only the logs say why.

use super::jwt::VerifiedToken;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Literal scheme marker expected in the `Authorization` header
pub const BEARER_MARKER: &str = "Bearer";

/// Browsers request this unprompted; it is never gated
const FAVICON_SUFFIX: &str = "favicon.ico";

/// Fixed message for every rejected request
const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Why a bearer token could not be read from the request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("missing authorization header on secure request")]
    Missing,

    #[error("more than one authorization header on request")]
    MultipleHeaders,

    #[error("malformed authorization header: {0}")]
    Malformed(&'static str),
}

/// Path exemption rules for the gate
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    exclusions: Arc<[String]>,
}

impl AuthGate {
    /// Build a gate from path prefixes that bypass authentication
    ///
    /// Prefixes are matched case-insensitively.
    pub fn new<I, S>(exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exclusions: Vec<String> = exclusions
            .into_iter()
            .map(|prefix| prefix.as_ref().trim().to_lowercase())
            .filter(|prefix| !prefix.is_empty())
            .collect();

        Self {
            exclusions: exclusions.into(),
        }
    }

    /// Whether `path` skips authentication
    pub fn is_exempt(&self, path: &str) -> bool {
        let path = path.trim().to_lowercase();

        if path.ends_with(FAVICON_SUFFIX) {
            return true;
        }

        self.exclusions
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Extract the bearer token from request headers
///
/// Exactly one header, exactly one `Bearer` marker with nothing before it,
/// and exactly one non-empty token after it. Anything else is rejected
/// outright; no partial recovery is attempted.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, ExtractError> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    let value = values.next().ok_or(ExtractError::Missing)?;
    if values.next().is_some() {
        return Err(ExtractError::MultipleHeaders);
    }

    let value = value
        .to_str()
        .map_err(|_| ExtractError::Malformed("header is not visible ASCII"))?;
    if value.trim().is_empty() {
        return Err(ExtractError::Missing);
    }

    let mut segments = value.split(BEARER_MARKER);
    let (scheme_prefix, token) = match (segments.next(), segments.next(), segments.next()) {
        (Some(prefix), Some(token), None) => (prefix, token.trim()),
        _ => return Err(ExtractError::Malformed("expected exactly one Bearer marker")),
    };

    if !scheme_prefix.trim().is_empty() {
        return Err(ExtractError::Malformed("unexpected text before Bearer marker"));
    }
    if token.is_empty() {
        return Err(ExtractError::Malformed("empty bearer token"));
    }
    if token.contains(char::is_whitespace) {
        return Err(ExtractError::Malformed("more than one token after Bearer marker"));
    }

    Ok(token)
}

/// Authenticated user attached to the request by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub token: Arc<VerifiedToken>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(unauthorized)
    }
}

/// Middleware that enforces authentication on every non-exempt path
///
/// Apply with `axum::middleware::from_fn_with_state`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_owned();

    if state.gate().is_exempt(&path) {
        debug!(path = %path, "path exempt from authentication");
        return Ok(next.run(request).await);
    }

    let token = extract_bearer(request.headers()).map_err(|e| {
        warn!(path = %path, error = %e, "rejected request without usable bearer token");
        record_rejection("bad_header");
        unauthorized()
    })?;

    let verification = state.jwt().verify(token);

    if !verification.valid {
        let reason = verification.failure_reason();
        let detail = verification
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        if verification.has_serious_errors {
            error!(path = %path, reason, error = %detail, "potentially malicious token rejected");
        } else {
            warn!(path = %path, reason, error = %detail, "token rejected");
        }

        record_rejection(reason);
        return Err(unauthorized());
    }

    let Some(verified) = verification.token else {
        error!(path = %path, "verification reported valid without a token");
        record_rejection("unknown");
        return Err(unauthorized());
    };

    let user_id = verified.subject_id().map_err(|e| {
        error!(path = %path, error = %e, "potentially malicious token rejected");
        record_rejection("invalid_subject");
        unauthorized()
    })?;

    request.extensions_mut().insert(AuthUser {
        user_id,
        token: Arc::new(verified),
    });

    Ok(next.run(request).await)
}

fn unauthorized() -> ApiError {
    ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
}

fn record_rejection(reason: &'static str) {
    metrics::counter!("auth_gate_rejections_total", "reason" => reason).increment(1);
}
