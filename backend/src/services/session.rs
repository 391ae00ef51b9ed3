//! Session service for sign-up and sign-in
//!
//! # Performance Optimizations
//!
//! - Password hashing/verification runs on blocking thread pool
//! - Token service is passed by reference (pre-computed keys)

use crate::auth::{HashFormatError, HashParams, PasswordError, PasswordService, TokenError, TokenService};
use crate::repositories::UserStore;
use chrono::{DateTime, Utc};
use coursebook_shared::validation::{validate_email, validate_non_empty};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Session errors
///
/// Credential failures (`UserNotFound`, `InvalidPassword`,
/// `CorruptCredential`) stay distinct here so they can be logged
/// differently; the HTTP layer collapses them into one response.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    InvalidEmail(String),

    #[error("{0}")]
    EmptyPassword(String),

    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("stored credential is corrupt: {0}")]
    CorruptCredential(HashFormatError),

    #[error("email already registered")]
    EmailTaken,

    #[error("failed to hash password: {0}")]
    Hashing(PasswordError),

    #[error("failed to generate token: {0}")]
    TokenGeneration(#[from] TokenError),

    #[error("user store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Issued session
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Session service for authentication operations
pub struct SessionService;

impl SessionService {
    /// Register a new user and issue a token
    ///
    /// # Performance
    /// Password hashing is offloaded to blocking thread pool via `spawn_blocking`.
    pub async fn sign_up(
        store: &dyn UserStore,
        tokens: &TokenService,
        params: &HashParams,
        email: &str,
        password: &str,
    ) -> Result<SessionResult, SessionError> {
        let outcome = Self::try_sign_up(store, tokens, params, email, password).await;
        record_outcome("sign_up", &outcome);
        outcome
    }

    async fn try_sign_up(
        store: &dyn UserStore,
        tokens: &TokenService,
        params: &HashParams,
        email: &str,
        password: &str,
    ) -> Result<SessionResult, SessionError> {
        validate_email(email).map_err(SessionError::InvalidEmail)?;
        validate_non_empty("password", password).map_err(SessionError::EmptyPassword)?;

        if store.find_by_email(email).await?.is_some() {
            return Err(SessionError::EmailTaken);
        }

        let password_hash = PasswordService::hash_async(password.to_string(), *params)
            .await
            .map_err(SessionError::Hashing)?;

        // The lookup above is only a fast path; a concurrent sign-up can still win here
        let user = store
            .create(email, &password_hash)
            .await?
            .ok_or(SessionError::EmailTaken)?;
        let issued = tokens.issue(user.id)?;

        info!(user_id = %user.id, "user signed up");

        Ok(SessionResult {
            token: issued.token,
            user_id: user.id,
            expires_at: issued.expires_at,
        })
    }

    /// Sign in with email and password
    ///
    /// # Performance
    /// Password verification is offloaded to blocking thread pool.
    pub async fn sign_in(
        store: &dyn UserStore,
        tokens: &TokenService,
        email: &str,
        password: &str,
    ) -> Result<SessionResult, SessionError> {
        let outcome = Self::try_sign_in(store, tokens, email, password).await;
        record_outcome("sign_in", &outcome);
        outcome
    }

    async fn try_sign_in(
        store: &dyn UserStore,
        tokens: &TokenService,
        email: &str,
        password: &str,
    ) -> Result<SessionResult, SessionError> {
        validate_email(email).map_err(SessionError::InvalidEmail)?;

        let user = store
            .find_by_email(email)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        match PasswordService::verify_async(password.to_string(), user.password_hash.clone()).await {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => {
                warn!(user_id = %user.id, "sign-in with wrong password");
                return Err(SessionError::InvalidPassword);
            }
            Err(PasswordError::Format(e)) => return Err(SessionError::CorruptCredential(e)),
            Err(e) => return Err(SessionError::Hashing(e)),
        }

        let issued = tokens.issue(user.id)?;

        Ok(SessionResult {
            token: issued.token,
            user_id: user.id,
            expires_at: issued.expires_at,
        })
    }
}

fn record_outcome(operation: &'static str, outcome: &Result<SessionResult, SessionError>) {
    let label = match outcome {
        Ok(_) => "success",
        Err(SessionError::InvalidEmail(_) | SessionError::EmptyPassword(_)) => "invalid_input",
        Err(SessionError::UserNotFound | SessionError::InvalidPassword) => "bad_credentials",
        Err(SessionError::CorruptCredential(_)) => "corrupt_credential",
        Err(SessionError::EmailTaken) => "email_taken",
        Err(_) => "error",
    };
    metrics::counter!("auth_sessions_total", "operation" => operation, "outcome" => label)
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryUserStore, UserRecord};

    fn test_params() -> HashParams {
        HashParams::new(256, 1, 1, 16, 32)
    }

    fn tokens() -> TokenService {
        TokenService::new("session-test-secret").unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let store = InMemoryUserStore::new();
        let tokens = tokens();

        let signed_up = SessionService::sign_up(&store, &tokens, &test_params(), "a@example.com", "pw12345")
            .await
            .unwrap();
        let verification = tokens.verify(&signed_up.token);
        assert!(verification.valid);

        let signed_in = SessionService::sign_in(&store, &tokens, "a@example.com", "pw12345")
            .await
            .unwrap();
        assert_eq!(signed_in.user_id, signed_up.user_id);
        assert_eq!(
            tokens
                .extract_subject(&tokens.verify(&signed_in.token).token.unwrap())
                .unwrap(),
            signed_up.user_id
        );
    }

    #[tokio::test]
    async fn test_sign_up_stores_encoded_hash_not_password() {
        let store = InMemoryUserStore::new();
        SessionService::sign_up(&store, &tokens(), &test_params(), "a@example.com", "plaintext")
            .await
            .unwrap();

        let record = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert!(record.password_hash.starts_with("$argon2id$v=19$m=256,t=1,p=1$"));
        assert!(!record.password_hash.contains("plaintext"));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        let tokens = tokens();
        SessionService::sign_up(&store, &tokens, &test_params(), "a@example.com", "pw")
            .await
            .unwrap();

        let result = SessionService::sign_up(&store, &tokens, &test_params(), "a@example.com", "pw").await;
        assert!(matches!(result, Err(SessionError::EmailTaken)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_sign_up_same_email() {
        let store = InMemoryUserStore::new();
        let tokens = tokens();
        let params = test_params();

        let (a, b) = tokio::join!(
            SessionService::sign_up(&store, &tokens, &params, "a@example.com", "first"),
            SessionService::sign_up(&store, &tokens, &params, "a@example.com", "second"),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(SessionError::EmailTaken))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sign_up_validates_input() {
        let store = InMemoryUserStore::new();
        let tokens = tokens();

        let bad_email = SessionService::sign_up(&store, &tokens, &test_params(), "nope", "pw").await;
        assert!(matches!(bad_email, Err(SessionError::InvalidEmail(_))));

        let blank_password =
            SessionService::sign_up(&store, &tokens, &test_params(), "a@example.com", "   ").await;
        assert!(matches!(blank_password, Err(SessionError::EmptyPassword(_))));

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sign_in_unknown_user() {
        let store = InMemoryUserStore::new();
        let result = SessionService::sign_in(&store, &tokens(), "ghost@example.com", "pw").await;
        assert!(matches!(result, Err(SessionError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let store = InMemoryUserStore::new();
        let tokens = tokens();
        SessionService::sign_up(&store, &tokens, &test_params(), "a@example.com", "right")
            .await
            .unwrap();

        let result = SessionService::sign_in(&store, &tokens, "a@example.com", "wrong").await;
        assert!(matches!(result, Err(SessionError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_sign_in_corrupt_hash() {
        let store = InMemoryUserStore::new();
        store
            .insert(UserRecord {
                id: Uuid::new_v4(),
                email: "a@example.com".to_string(),
                password_hash: "$argon2id$v=19$m=65536,t=3,p=2$onlysalt".to_string(),
                created_at: Utc::now(),
            })
            .await;

        let result = SessionService::sign_in(&store, &tokens(), "a@example.com", "pw").await;
        assert!(matches!(
            result,
            Err(SessionError::CorruptCredential(HashFormatError::InvalidHashFormat))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_short_stored_salt_is_corrupt_credential() {
        let store = InMemoryUserStore::new();
        store
            .insert(UserRecord {
                id: Uuid::new_v4(),
                email: "a@example.com".to_string(),
                password_hash: "$argon2id$v=19$m=256,t=1,p=1$c2FsdA$a2V5a2V5a2V5".to_string(),
                created_at: Utc::now(),
            })
            .await;

        let result = SessionService::sign_in(&store, &tokens(), "a@example.com", "pw").await;
        assert!(matches!(
            result,
            Err(SessionError::CorruptCredential(HashFormatError::UnusableParameters(_)))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_uses_params_from_stored_hash() {
        let store = InMemoryUserStore::new();
        let tokens = tokens();
        let old_params = HashParams::new(128, 2, 1, 8, 16);
        SessionService::sign_up(&store, &tokens, &old_params, "a@example.com", "pw")
            .await
            .unwrap();

        // Current defaults differ; verification must still succeed
        assert!(SessionService::sign_in(&store, &tokens, "a@example.com", "pw")
            .await
            .is_ok());
    }
}
