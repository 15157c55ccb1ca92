//! Realm slug handling.
//!
//! A realm is the tenant boundary for every entity in the broker. Realms are
//! identified by a slug-like string; no entity is valid outside its realm.

use crate::error::{BrokerError, BrokerResult};

/// Maximum length of a realm slug.
pub const MAX_SLUG_LENGTH: usize = 128;

/// Generates a new opaque identifier.
///
/// Used for subject ids and other stable identifiers that are generated
/// once and never reused.
#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Returns `true` if the given string is a valid realm slug.
///
/// Slugs are 1..=128 characters of lowercase ASCII alphanumerics plus
/// `-`, `_` and `.`.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
}

/// Validates a realm slug.
///
/// # Errors
///
/// Returns `InvalidInput` if the slug is empty, too long, or contains
/// characters outside the slug alphabet.
pub fn validate_slug(slug: &str) -> BrokerResult<()> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(BrokerError::invalid_input(format!(
            "invalid realm slug: {slug}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("acme"));
        assert!(is_valid_slug("acme-corp"));
        assert!(is_valid_slug("tenant_01"));
        assert!(is_valid_slug("eu.west.acme"));
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Acme"));
        assert!(!is_valid_slug("acme corp"));
        assert!(!is_valid_slug("acme/corp"));
        assert!(!is_valid_slug(&"a".repeat(MAX_SLUG_LENGTH + 1)));
    }

    #[test]
    fn test_validate_slug_error() {
        assert!(validate_slug("acme").is_ok());
        let err = validate_slug("Not A Slug").unwrap_err();
        assert!(err.to_string().contains("invalid realm slug"));
    }

    #[test]
    fn test_generate_id_is_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
