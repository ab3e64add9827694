//! Password hashing.
//!
//! Two formats can appear in a stored user record:
//!
//! - **legacy**: a 32-bit folded rolling hash (`h = h * 31 + c` over UTF-16
//!   code units) rendered as a signed decimal string. It is *not* a
//!   cryptographic hash; it exists so account documents written by earlier
//!   versions of the game keep working.
//! - **pbkdf2**: PBKDF2-HMAC-SHA256 via `ring`, stored as
//!   `pbkdf2-sha256$<iterations>$base64(salt)$base64(hash)`.
//!
//! [`verify`] dispatches on the stored format, so a store can hold a mix of
//! both while accounts are upgraded. Async callers go through
//! [`PasswordScheme::hash_blocking`] and [`verify_blocking`], which move the
//! PBKDF2 work onto tokio's blocking pool.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Prefix that marks a PBKDF2 hash string.
const PBKDF2_PREFIX: &str = "pbkdf2-sha256";

/// Salt length in bytes.
const SALT_LEN: usize = 32;

/// Derived key length in bytes.
const KEY_LEN: usize = 32;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Which format new hashes are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum PasswordScheme {
    /// The rolling hash, byte-compatible with existing stored documents.
    Legacy,
    /// Salted PBKDF2-HMAC-SHA256.
    Pbkdf2 { iterations: u32 },
}

impl Default for PasswordScheme {
    /// PBKDF2 with 600,000 iterations (OWASP 2023).
    fn default() -> Self {
        Self::Pbkdf2 {
            iterations: 600_000,
        }
    }
}

impl PasswordScheme {
    /// Hash `password` into its storable string form.
    pub fn hash(&self, password: &str) -> StoreResult<String> {
        match *self {
            Self::Legacy => Ok(legacy_hash(password)),
            Self::Pbkdf2 { iterations } => pbkdf2_hash(password, iterations),
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_blocking(self, password: &str) -> StoreResult<String> {
        let password = password.to_owned();
        // CPU-intensive, done inside spawn_blocking.
        tokio::task::spawn_blocking(move || self.hash(&password)).await?
    }

    /// Whether a stored hash should be rewritten by this scheme on the next
    /// successful login. Only legacy hashes are ever rewritten.
    pub fn needs_rehash(&self, stored: &str) -> bool {
        matches!(self, Self::Pbkdf2 { .. }) && !is_pbkdf2(stored)
    }
}

/// Check `password` against a stored hash of either format.
pub fn verify(password: &str, stored: &str) -> StoreResult<bool> {
    if is_pbkdf2(stored) {
        pbkdf2_verify(password, stored)
    } else {
        Ok(legacy_hash(password) == stored)
    }
}

/// [`verify`] on the blocking pool.
pub async fn verify_blocking(password: &str, stored: &str) -> StoreResult<bool> {
    let password = password.to_owned();
    let stored = stored.to_owned();
    tokio::task::spawn_blocking(move || verify(&password, &stored)).await?
}

fn is_pbkdf2(stored: &str) -> bool {
    stored.starts_with(PBKDF2_PREFIX)
}

/// The legacy rolling hash. Wrapping `i32` arithmetic reproduces the
/// 32-bit fold of the stored documents exactly.
pub fn legacy_hash(password: &str) -> String {
    let hash = password.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    hash.to_string()
}

fn iterations(n: u32) -> StoreResult<NonZeroU32> {
    NonZeroU32::new(n)
        .ok_or_else(|| StoreError::InvalidArgument("pbkdf2 iterations must be non-zero".into()))
}

fn pbkdf2_hash(password: &str, n: u32) -> StoreResult<String> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| StoreError::InvalidArgument("failed to generate random salt".into()))?;

    let mut hash = [0u8; KEY_LEN];
    pbkdf2::derive(PBKDF2_ALG, iterations(n)?, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "{PBKDF2_PREFIX}${n}${}${}",
        BASE64.encode(salt),
        BASE64.encode(hash)
    ))
}

fn pbkdf2_verify(password: &str, stored: &str) -> StoreResult<bool> {
    let parts: Vec<&str> = stored.split('$').collect();
    let [_, n, salt, expected] = parts.as_slice() else {
        return Err(StoreError::InvalidArgument("malformed password hash".into()));
    };

    let n: u32 = n
        .parse()
        .map_err(|e| StoreError::InvalidArgument(format!("invalid iteration count: {e}")))?;
    let salt = BASE64
        .decode(salt)
        .map_err(|e| StoreError::InvalidArgument(format!("invalid salt encoding: {e}")))?;
    let expected = BASE64
        .decode(expected)
        .map_err(|e| StoreError::InvalidArgument(format!("invalid hash encoding: {e}")))?;

    Ok(pbkdf2::verify(
        PBKDF2_ALG,
        iterations(n)?,
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok())
}

// ── tests ────────────────────────────────────────────────────────────
