//! Security key generation.
//!
//! Confirmation and reset keys are single-use, time-bounded tokens. They are
//! 256-bit random values encoded as hexadecimal, generated from the thread
//! RNG. The key itself is the lookup token; it must be unguessable.

use rand::Rng;

/// Generate a fresh confirmation/reset key.
///
/// 256 bits of randomness, hex encoded (64 characters).
#[must_use]
pub fn generate_key() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Generate a random lockout password.
///
/// Used after a confirmed reset: the account password is replaced with a
/// value nobody knows, forcing a subsequent password-set flow.
#[must_use]
pub fn generate_random_password() -> String {
    let bytes: [u8; 24] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_and_charset() {
        let key = generate_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(generate_key(), generate_key());
        assert_ne!(generate_random_password(), generate_random_password());
    }
}
