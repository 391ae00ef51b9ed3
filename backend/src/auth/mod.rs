//! Authentication module
//!
//! Provides JWT-based authentication with argon2 password hashing:
//! - `hash_codec`: the self-describing `$argon2id$...` hash format
//! - `password`: hashing and constant-time verification
//! - `jwt`: token issuance and classified verification
//! - `middleware`: the request gate and `AuthUser` extractor

pub mod hash_codec;
mod jwt;
mod middleware;
mod password;

pub use hash_codec::{DecodedHash, HashFormatError, HashParams};
pub use jwt::{
    Claims, IssuedToken, JwtKeys, TokenError, TokenService, TokenVerification, VerifiedToken,
    TOKEN_LIFETIME_SECS,
};
pub use middleware::{extract_bearer, require_auth, AuthGate, AuthUser, ExtractError, BEARER_MARKER};
pub use password::{PasswordError, PasswordService};
