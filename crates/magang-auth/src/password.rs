//! Password hashing with PBKDF2-HMAC-SHA256 (ring).
//!
//! Passwords are stored as `base64(salt):base64(hash)` strings, using
//! 600,000 iterations per OWASP 2023 recommendations. Each hash gets a
//! fresh 32-byte random salt, so the same password never produces the
//! same stored string twice.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::warn;

use crate::error::{AuthError, AuthResult};

/// PBKDF2-HMAC-SHA256 iteration count (OWASP 2023).
const PBKDF2_ITERATIONS: u32 = 600_000;

/// Salt length in bytes.
const SALT_LEN: usize = 32;

/// Derived key length in bytes.
const KEY_LEN: usize = 32;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

fn iterations() -> std::num::NonZeroU32 {
    std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2_ITERATIONS is non-zero")
}

/// Hash `password` into a storable `base64(salt):base64(hash)` string.
pub(crate) fn hash(password: &str) -> AuthResult<String> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| AuthError::Hash("failed to generate random salt".into()))?;

    let mut derived = [0u8; KEY_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        iterations(),
        &salt,
        password.as_bytes(),
        &mut derived,
    );

    Ok(format!("{}:{}", BASE64.encode(salt), BASE64.encode(derived)))
}

/// Verify `password` against a stored hash string.
///
/// A malformed stored hash verifies as `false` (with a warning) rather
/// than erroring, so sign-in keeps its uniform failure path.
pub(crate) fn verify(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once(':') else {
        warn!("malformed password hash in credential record");
        return false;
    };

    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt), BASE64.decode(expected)) else {
        warn!("undecodable password hash in credential record");
        return false;
    };

    pbkdf2::verify(
        PBKDF2_ALG,
        iterations(),
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}

// ── tests ────────────────────────────────────────────────────────────
