//! API request and response types

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Sign-in / sign-up request body
///
/// The password is held as a [`SecretString`] so that it is redacted from
/// `Debug` output and zeroed when the request is dropped.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
    pub password: SecretString,
}

/// Issued session returned by sign-in and sign-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Identity of the caller, as resolved from their bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
