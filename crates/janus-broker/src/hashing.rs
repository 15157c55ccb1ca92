//! Password hashing.
//!
//! Salted Argon2id hashing for account passwords.
//!
//! # Security
//!
//! - Hashing uses Argon2id (hybrid mode) with default parameters
//! - Salts are generated using OsRng (cryptographically secure RNG)
//! - Hashes are stored in PHC string format; plaintext is never persisted
//!   or logged

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use janus_core::{BrokerError, BrokerResult};

/// Hash a password for secure storage using Argon2id.
///
/// # Errors
///
/// Returns a `Storage` error if hashing fails (rare).
pub fn hash_password(password: &str) -> BrokerResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| BrokerError::storage(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `false` for a non-matching password and for a hash that cannot
/// be parsed: an unreadable hash can never match a credential.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
