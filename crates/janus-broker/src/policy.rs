//! Password policy engine.
//!
//! Pure validation logic for password strength. Policies are value objects:
//! they are evaluated fresh on every call and never cached, so a
//! configuration reload takes effect on the next operation.

use janus_core::PolicyViolation;

/// Default minimum password length.
pub const DEFAULT_MIN_LENGTH: usize = 8;

/// Default maximum password length.
pub const DEFAULT_MAX_LENGTH: usize = 64;

/// Password strength requirements for an authority.
///
/// Validation reports the *first* violated rule, checked in a fixed order:
/// empty, min-length, max-length, require-alpha, require-number,
/// require-special, contains-whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum password length in characters.
    pub min_length: usize,

    /// Maximum password length in characters.
    pub max_length: usize,

    /// Require at least one alphabetic character.
    pub require_alpha: bool,

    /// Require at least one numeric character.
    pub require_number: bool,

    /// Require at least one special (non-alphanumeric) character.
    pub require_special: bool,

    /// Whether whitespace characters are allowed.
    pub allow_whitespace: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            require_alpha: true,
            require_number: true,
            require_special: false,
            allow_whitespace: false,
        }
    }
}

impl PasswordPolicy {
    /// Creates a policy with the default requirements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum length.
    #[must_use]
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Requires at least one alphabetic character.
    #[must_use]
    pub fn with_require_alpha(mut self, required: bool) -> Self {
        self.require_alpha = required;
        self
    }

    /// Requires at least one numeric character.
    #[must_use]
    pub fn with_require_number(mut self, required: bool) -> Self {
        self.require_number = required;
        self
    }

    /// Requires at least one special character.
    #[must_use]
    pub fn with_require_special(mut self, required: bool) -> Self {
        self.require_special = required;
        self
    }

    /// Allows whitespace characters.
    #[must_use]
    pub fn with_allow_whitespace(mut self, allowed: bool) -> Self {
        self.allow_whitespace = allowed;
        self
    }

    /// Validates a candidate password against this policy.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as a [`PolicyViolation`].
    pub fn validate(&self, password: &str) -> Result<(), PolicyViolation> {
        if password.is_empty() {
            return Err(PolicyViolation::Empty);
        }
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PolicyViolation::MinLength(self.min_length));
        }
        if length > self.max_length {
            return Err(PolicyViolation::MaxLength(self.max_length));
        }
        if self.require_alpha && !password.chars().any(char::is_alphabetic) {
            return Err(PolicyViolation::RequireAlpha);
        }
        if self.require_number && !password.chars().any(char::is_numeric) {
            return Err(PolicyViolation::RequireNumber);
        }
        if self.require_special
            && !password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            return Err(PolicyViolation::RequireSpecial);
        }
        if !self.allow_whitespace && password.chars().any(char::is_whitespace) {
            return Err(PolicyViolation::ContainsWhitespace);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_accepts_reasonable_password() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("correcthorse1").is_ok());
    }

    #[test]
    fn test_empty_reported_before_min_length() {
        let policy = PasswordPolicy::default();
        assert_eq!(policy.validate(""), Err(PolicyViolation::Empty));
    }

    #[test]
    fn test_min_length() {
        let policy = PasswordPolicy::new()
            .with_min_length(8)
            .with_require_number(true);
        // Too short and missing a number: min-length wins, it is checked first.
        assert_eq!(
            policy.validate("abcdefg"),
            Err(PolicyViolation::MinLength(8))
        );
        assert!(policy.validate("abcdefg1").is_ok());
    }

    #[test]
    fn test_max_length() {
        let policy = PasswordPolicy::new().with_max_length(10);
        assert_eq!(
            policy.validate("abcdefgh1jk"),
            Err(PolicyViolation::MaxLength(10))
        );
    }

    #[test]
    fn test_require_alpha() {
        let policy = PasswordPolicy::new().with_min_length(4);
        assert_eq!(
            policy.validate("12345678"),
            Err(PolicyViolation::RequireAlpha)
        );
    }

    #[test]
    fn test_require_number() {
        let policy = PasswordPolicy::new();
        assert_eq!(
            policy.validate("abcdefgh"),
            Err(PolicyViolation::RequireNumber)
        );
    }

    #[test]
    fn test_require_special() {
        let policy = PasswordPolicy::new().with_require_special(true);
        assert_eq!(
            policy.validate("abcdefg1"),
            Err(PolicyViolation::RequireSpecial)
        );
        assert!(policy.validate("abcdefg1!").is_ok());
    }

    #[test]
    fn test_whitespace_rejected_by_default() {
        let policy = PasswordPolicy::new();
        assert_eq!(
            policy.validate("abcd efg1"),
            Err(PolicyViolation::ContainsWhitespace)
        );
        let relaxed = PasswordPolicy::new().with_allow_whitespace(true);
        assert!(relaxed.validate("abcd efg1").is_ok());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let policy = PasswordPolicy::new()
            .with_min_length(4)
            .with_require_number(false);
        // Four multi-byte characters satisfy a min length of four.
        assert!(policy.validate("äöüß").is_ok());
    }
}
