//! Credential hashing: Argon2id with a fresh random salt per call.

use anyhow::{anyhow, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

/// Hash a password into a PHC string. Two calls with the same input produce
/// different outputs (embedded salt); both verify against the password.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Constant-time verification. A malformed stored hash verifies as `false`
/// rather than erroring, so corrupt rows cannot crash a login attempt.
#[must_use]
pub fn verify(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
