//! Encoded password hash format
//!
//! Stored hashes are self-describing strings of the form
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=2$<base64(salt)>$<base64(key)>
//! ```
//!
//! Cost parameters travel inside the string, so verification always uses
//! the parameters a hash was created with, never the current defaults.
//! Salt and key lengths are not stored; they are the decoded byte lengths.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Algorithm tag written into every encoded hash
pub const ALGORITHM_TAG: &str = "argon2id";

/// Argon2 version this implementation derives with (0x13)
pub const ARGON2_VERSION: u32 = 19;

/// Fields produced by splitting on `$`, including the empty leading one
const FIELD_COUNT: usize = 6;

/// Password hash decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashFormatError {
    #[error("the encoded hash is not in the correct format")]
    InvalidHashFormat,

    #[error("incompatible version of argon2: found {found}, expected {}", ARGON2_VERSION)]
    IncompatibleVersion { found: u32 },

    #[error("invalid base64 in {segment} segment: {source}")]
    InvalidBase64 {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// Decodes cleanly but Argon2 cannot derive with what it carries
    #[error("unusable argon2 parameters in encoded hash: {0}")]
    UnusableParameters(String),
}

/// Argon2id cost parameters
///
/// Immutable once constructed. `salt_length` and `key_length` only matter
/// when hashing; a decoded hash reports the lengths it actually contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    memory_cost_kib: u32,
    iterations: u32,
    parallelism: u8,
    salt_length: u32,
    key_length: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_cost_kib: 64 * 1024, // 64 MiB
            iterations: 3,
            parallelism: 2,
            salt_length: 16,
            key_length: 32,
        }
    }
}

impl HashParams {
    pub const fn new(
        memory_cost_kib: u32,
        iterations: u32,
        parallelism: u8,
        salt_length: u32,
        key_length: u32,
    ) -> Self {
        Self {
            memory_cost_kib,
            iterations,
            parallelism,
            salt_length,
            key_length,
        }
    }

    #[inline]
    pub fn memory_cost_kib(&self) -> u32 {
        self.memory_cost_kib
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[inline]
    pub fn parallelism(&self) -> u8 {
        self.parallelism
    }

    #[inline]
    pub fn salt_length(&self) -> u32 {
        self.salt_length
    }

    #[inline]
    pub fn key_length(&self) -> u32 {
        self.key_length
    }
}

/// A decoded hash: the parameters, salt and derived key it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHash {
    pub params: HashParams,
    pub salt: Vec<u8>,
    pub key: Vec<u8>,
}

/// Encode parameters, salt and derived key into the canonical string form
pub fn encode(params: &HashParams, salt: &[u8], key: &[u8]) -> String {
    format!(
        "${}$v={}$m={},t={},p={}${}${}",
        ALGORITHM_TAG,
        ARGON2_VERSION,
        params.memory_cost_kib,
        params.iterations,
        params.parallelism,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(key),
    )
}

/// Decode a canonical hash string
pub fn decode(encoded: &str) -> Result<DecodedHash, HashFormatError> {
    let fields: Vec<&str> = encoded.split('$').collect();
    if fields.len() != FIELD_COUNT {
        return Err(HashFormatError::InvalidHashFormat);
    }

    if !fields[0].is_empty() || fields[1] != ALGORITHM_TAG {
        return Err(HashFormatError::InvalidHashFormat);
    }

    let version: u32 = parse_named(Some(fields[2]), "v")?;
    if version != ARGON2_VERSION {
        return Err(HashFormatError::IncompatibleVersion { found: version });
    }

    let (memory_cost_kib, iterations, parallelism) = parse_params(fields[3])?;

    let salt = decode_segment(fields[4], "salt")?;
    let key = decode_segment(fields[5], "key")?;

    let params = HashParams {
        memory_cost_kib,
        iterations,
        parallelism,
        salt_length: u32::try_from(salt.len()).map_err(|_| HashFormatError::InvalidHashFormat)?,
        key_length: u32::try_from(key.len()).map_err(|_| HashFormatError::InvalidHashFormat)?,
    };

    Ok(DecodedHash { params, salt, key })
}

/// Parse `m=<u32>,t=<u32>,p=<u8>`, in that order and nothing else
fn parse_params(field: &str) -> Result<(u32, u32, u8), HashFormatError> {
    let mut parts = field.split(',');
    let memory = parse_named(parts.next(), "m")?;
    let iterations = parse_named(parts.next(), "t")?;
    let parallelism = parse_named(parts.next(), "p")?;

    if parts.next().is_some() {
        return Err(HashFormatError::InvalidHashFormat);
    }

    Ok((memory, iterations, parallelism))
}

/// Parse a single `name=<integer>` pair
fn parse_named<T: FromStr>(part: Option<&str>, name: &str) -> Result<T, HashFormatError> {
    let (key, value) = part
        .and_then(|p| p.split_once('='))
        .ok_or(HashFormatError::InvalidHashFormat)?;

    if key != name || value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HashFormatError::InvalidHashFormat);
    }

    value.parse().map_err(|_| HashFormatError::InvalidHashFormat)
}

fn decode_segment(segment: &str, name: &'static str) -> Result<Vec<u8>, HashFormatError> {
    STANDARD_NO_PAD
        .decode(segment)
        .map_err(|source| HashFormatError::InvalidBase64 {
            segment: name,
            source,
        })
}
