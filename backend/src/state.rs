//! Application state management
//!
//! Shared state passed to handlers and the auth gate via Axum's state
//! extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys and gate rules are built once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Immutable after creation**: State is read-only during request handling

use crate::auth::{AuthGate, HashParams, TokenError, TokenService};
use crate::config::AppConfig;
use crate::repositories::UserStore;
use std::sync::Arc;

/// Shared application state
///
/// # Performance
///
/// - `users`: trait object behind Arc, cloning is O(1)
/// - `config`: Wrapped in Arc, cloning is O(1)
/// - `jwt`: Pre-computed keys wrapped in Arc, cloning is O(1)
/// - `gate`: Exclusion list behind Arc, cloning is O(1)
#[derive(Clone)]
pub struct AppState {
    /// Credential store
    pub users: Arc<dyn UserStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized token service with cached keys
    pub jwt: TokenService,
    /// Path exemption rules for the auth gate
    pub gate: AuthGate,
}

impl AppState {
    /// Create a new application state
    ///
    /// Fails when the configured signing secret is blank.
    pub fn new(users: Arc<dyn UserStore>, config: AppConfig) -> Result<Self, TokenError> {
        let jwt = TokenService::new(&config.jwt.secret)?;
        let gate = AuthGate::new(&config.auth.path_exclusions);

        Ok(Self {
            users,
            config: Arc::new(config),
            jwt,
            gate,
        })
    }

    #[inline]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the token service
    #[inline]
    pub fn jwt(&self) -> &TokenService {
        &self.jwt
    }

    #[inline]
    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Parameters used for newly hashed passwords
    #[inline]
    pub fn password_params(&self) -> &HashParams {
        &self.config.password
    }
}
