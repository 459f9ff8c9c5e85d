//! Password verification using Argon2id.
//!
//! Hashing happens at the storage boundary (`bookline-db`) when a user
//! is created or their password changed; this module only verifies at
//! login time. Both sides must agree on the optional pepper.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Prepend the pepper, when configured, to the password bytes.
pub(crate) fn peppered(password: &str, pepper: Option<&str>) -> Vec<u8> {
    match pepper {
        Some(p) => format!("{p}{password}").into_bytes(),
        None => password.as_bytes().to_vec(),
    }
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// `Ok(true)` on match, `Ok(false)` on mismatch,
/// `Err(AuthError::Crypto)` if the stored hash cannot be parsed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let input = peppered(password, pepper);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(&input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}
