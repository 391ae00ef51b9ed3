//! JWT token generation and validation
//!
//! Issues fixed-lifetime HS256 bearer tokens and classifies verification
//! failures so callers can tell an expired session from a forged token.
//! Keys are derived once from the process secret and shared via `Arc`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of every issued token
pub const TOKEN_LIFETIME_SECS: i64 = 30 * 60;

/// Token issuance errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing secret is missing or blank")]
    MissingSecret,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token subject is missing or not a valid identifier")]
    InvalidSubject,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not valid before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl Claims {
    /// Parse the subject as a user ID
    pub fn subject_id(&self) -> Result<Uuid, TokenError> {
        if self.sub.is_empty() {
            return Err(TokenError::InvalidSubject);
        }
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSubject)
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// A token whose signature and time bounds have been checked
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub header: Header,
    pub claims: Claims,
}

impl VerifiedToken {
    /// Re-derive the authenticated user ID from the subject claim
    #[inline]
    pub fn subject_id(&self) -> Result<Uuid, TokenError> {
        self.claims.subject_id()
    }
}

/// Freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of verifying a token
///
/// Flags are not exclusive: a malformed token is also `has_serious_errors`.
/// `expired` and `too_early` are routine and leave `has_serious_errors`
/// unset; anything unrecognised is treated as serious.
#[derive(Debug, Default)]
pub struct TokenVerification {
    pub valid: bool,
    pub malformed: bool,
    pub invalid_signature: bool,
    pub expired: bool,
    pub too_early: bool,
    pub has_serious_errors: bool,
    /// Verified token when valid
    pub token: Option<VerifiedToken>,
    /// Decoded claims, when the token could be parsed and authenticated
    pub claims: Option<Claims>,
    /// Underlying error, when verification failed
    pub error: Option<jsonwebtoken::errors::Error>,
}

impl TokenVerification {
    fn failed(error: jsonwebtoken::errors::Error) -> Self {
        let mut result = Self::default();

        match error.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => {
                result.malformed = true;
                result.has_serious_errors = true;
            }
            ErrorKind::InvalidSignature => {
                result.invalid_signature = true;
                result.has_serious_errors = true;
            }
            ErrorKind::ExpiredSignature => result.expired = true,
            ErrorKind::ImmatureSignature => result.too_early = true,
            _ => result.has_serious_errors = true,
        }

        result.error = Some(error);
        result
    }

    /// Short label for the failure kind, for logs and metrics
    pub fn failure_reason(&self) -> &'static str {
        if self.valid {
            "none"
        } else if self.malformed {
            "malformed"
        } else if self.invalid_signature {
            "invalid_signature"
        } else if self.expired {
            "expired"
        } else if self.too_early {
            "too_early"
        } else {
            "unknown"
        }
    }
}

/// Pre-computed JWT keys for efficient token operations
/// These are expensive to create, so we cache them in AppState
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    /// Create new JWT keys from secret
    /// This should be called once at startup
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        })
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// JWT service for token operations
///
/// Holds the only copy of the signing keys. Immutable after construction,
/// so clones can be read concurrently from every request without locking.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    validation: Arc<Validation>,
}

impl TokenService {
    /// Create a new token service with pre-computed keys
    ///
    /// # Performance Note
    /// Call this once at application startup and store in AppState.
    /// Do NOT create per-request.
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        Ok(Self {
            keys: JwtKeys::new(secret)?,
            validation: Arc::new(strict_validation()),
        })
    }

    /// Issue a token for a user, valid for [`TOKEN_LIFETIME_SECS`]
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(TOKEN_LIFETIME_SECS);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            nbf: None,
        };

        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, self.keys.encoding())
            .map_err(TokenError::Signing)
    }

    /// Verify a token and classify the outcome
    pub fn verify(&self, token: &str) -> TokenVerification {
        match decode::<Claims>(token, self.keys.decoding(), &self.validation) {
            Ok(data) => TokenVerification {
                valid: true,
                claims: Some(data.claims.clone()),
                token: Some(VerifiedToken {
                    header: data.header,
                    claims: data.claims,
                }),
                ..Default::default()
            },
            Err(error) => {
                let mut result = TokenVerification::failed(error);
                if result.expired || result.too_early {
                    result.claims = self.decode_ignoring_time(token);
                }
                result
            }
        }
    }

    /// Extract the user ID from a verified token
    #[inline]
    pub fn extract_subject(&self, token: &VerifiedToken) -> Result<Uuid, TokenError> {
        token.subject_id()
    }

    /// Signature-checked decode with the time bounds switched off
    fn decode_ignoring_time(&self, token: &str) -> Option<Claims> {
        let mut relaxed = (*self.validation).clone();
        relaxed.validate_exp = false;
        relaxed.validate_nbf = false;
        decode::<Claims>(token, self.keys.decoding(), &relaxed)
            .ok()
            .map(|data| data.claims)
    }
}

/// HS256 only, `exp` mandatory, `nbf` honoured, no clock leeway
fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;
    validation
}
