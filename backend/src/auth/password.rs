//! Password hashing using argon2
//!
//! Derives and verifies Argon2id password hashes stored in the
//! self-describing format from [`hash_codec`](super::hash_codec).
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU- and memory-intensive; the cost is the
//! security mechanism. In async contexts use [`PasswordService::hash_async`]
//! and [`PasswordService::verify_async`], which run on the blocking pool.

use super::hash_codec::{self, HashFormatError, HashParams};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The stored hash could not be decoded
    #[error(transparent)]
    Format(#[from] HashFormatError),

    /// The hash decoded fine but the password is wrong
    #[error("password does not match encoded hash")]
    Mismatch,

    /// The OS random source failed; nothing can be hashed safely
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// Argon2 refused the cost parameters
    #[error("invalid argon2 parameters: {0}")]
    InvalidParameters(String),

    #[error("task join error: {0}")]
    Task(String),
}

/// Password hashing service
///
/// Uses Argon2id which is the recommended variant for password hashing.
/// It provides resistance against both side-channel and GPU-based attacks.
pub struct PasswordService;

impl PasswordService {
    /// Hash a password (blocking operation)
    ///
    /// Falls back to [`HashParams::default`] when `params` is `None`.
    ///
    /// # Performance Note
    /// This is CPU-intensive. For async contexts, wrap in `spawn_blocking`:
    /// ```ignore
    /// let hash = tokio::task::spawn_blocking(move || {
    ///     PasswordService::hash(&password, None)
    /// }).await??;
    /// ```
    pub fn hash(password: &str, params: Option<&HashParams>) -> Result<String, PasswordError> {
        let params = params.copied().unwrap_or_default();

        let mut salt = vec![0u8; params.salt_length() as usize];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| PasswordError::RandomSource(e.to_string()))?;

        let key = derive_key(password, &salt, &params, params.key_length() as usize)
            .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(hash_codec::encode(&params, &salt, &key))
    }

    /// Hash a password asynchronously (non-blocking)
    ///
    /// Spawns the CPU-intensive work on a blocking thread pool,
    /// preventing it from blocking the async runtime.
    pub async fn hash_async(password: String, params: HashParams) -> Result<String, PasswordError> {
        tokio::task::spawn_blocking(move || Self::hash(&password, Some(&params)))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Verify a password against an encoded hash (blocking operation)
    ///
    /// Re-derives the key with the parameters embedded in `encoded_hash`.
    /// Returns [`PasswordError::Mismatch`] for a wrong password and
    /// [`PasswordError::Format`] for a corrupt hash.
    pub fn verify(password: &str, encoded_hash: &str) -> Result<(), PasswordError> {
        let decoded = hash_codec::decode(encoded_hash)?;

        // A stored hash Argon2 cannot derive with is corrupt, not a hashing failure
        let derived = derive_key(password, &decoded.salt, &decoded.params, decoded.key.len())
            .map_err(|e| HashFormatError::UnusableParameters(e.to_string()))?;

        if constant_time_eq(&decoded.key, &derived) {
            Ok(())
        } else {
            Err(PasswordError::Mismatch)
        }
    }

    /// Verify a password asynchronously (non-blocking)
    ///
    /// Spawns the CPU-intensive work on a blocking thread pool.
    pub async fn verify_async(password: String, encoded_hash: String) -> Result<(), PasswordError> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &encoded_hash))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }
}

fn derive_key(
    password: &str,
    salt: &[u8],
    params: &HashParams,
    key_length: usize,
) -> Result<Vec<u8>, argon2::Error> {
    let argon2_params = Params::new(
        params.memory_cost_kib(),
        params.iterations(),
        u32::from(params.parallelism()),
        Some(key_length),
    )?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = vec![0u8; key_length];
    argon2.hash_password_into(password.as_bytes(), salt, &mut key)?;

    Ok(key)
}

/// Constant-time comparison to prevent timing attacks
///
/// Always walks the longer input and folds the length difference in, so
/// neither content nor length short-circuits.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut result = (a.len() ^ b.len()) as u64;
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        result |= u64::from(x ^ y);
    }
    std::hint::black_box(result) == 0
}
