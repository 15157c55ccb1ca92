//! Error taxonomy shared across the identity broker.
//!
//! Every failure surfaced by the broker falls into one of the variants of
//! [`BrokerError`]. Security-sensitive key validation failures are always
//! reported as `InvalidInput("invalid-key")` so that callers cannot
//! distinguish "expired" from "wrong" from "already consumed".

use std::fmt;

use thiserror::Error;

/// Errors that can occur during identity broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The requested entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind (e.g., "account", "subject").
        kind: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// An entity with the same identifier already exists.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Entity kind (e.g., "account").
        kind: String,
        /// Conflicting identifier.
        id: String,
    },

    /// The input is malformed or not acceptable.
    ///
    /// All reset/confirmation key validation failures collapse into this
    /// variant with the generic message `invalid-key`.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected input.
        message: String,
    },

    /// A credential violated the configured password policy.
    ///
    /// The violated rule is safe to reveal: it describes the policy, not
    /// the account.
    #[error("invalid credential: {reason}")]
    InvalidCredential {
        /// The first violated policy rule.
        reason: PolicyViolation,
    },

    /// The operation is disabled by the provider configuration.
    #[error("capability disabled: {capability}")]
    CapabilityDisabled {
        /// Name of the disabled capability flag.
        capability: String,
    },

    /// The entity is in a state that forbids the requested transition.
    #[error("illegal state: {message}")]
    IllegalState {
        /// Description of the violated state invariant.
        message: String,
    },

    /// An error occurred in the underlying store.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },
}

impl BrokerError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates the generic key validation error.
    ///
    /// Used for every reset/confirmation key failure regardless of cause.
    #[must_use]
    pub fn invalid_key() -> Self {
        Self::InvalidInput {
            message: "invalid-key".to_string(),
        }
    }

    /// Creates a new `InvalidCredential` error.
    #[must_use]
    pub fn invalid_credential(reason: PolicyViolation) -> Self {
        Self::InvalidCredential { reason }
    }

    /// Creates a new `CapabilityDisabled` error.
    #[must_use]
    pub fn capability_disabled(capability: impl Into<String>) -> Self {
        Self::CapabilityDisabled {
            capability: capability.into(),
        }
    }

    /// Creates a new `IllegalState` error.
    #[must_use]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is caused by the caller (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage { .. })
    }

    /// Returns `true` if this error comes from the infrastructure (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Returns `true` if the caller may recover by creating the entity.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Type alias for identity broker results.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// The first password policy rule violated by a candidate password.
///
/// Reported in declaration order: an empty password is always reported as
/// [`PolicyViolation::Empty`] even if it would also be too short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyViolation {
    /// The password is empty.
    Empty,
    /// The password is shorter than the configured minimum.
    MinLength(usize),
    /// The password is longer than the configured maximum.
    MaxLength(usize),
    /// The policy requires at least one alphabetic character.
    RequireAlpha,
    /// The policy requires at least one numeric character.
    RequireNumber,
    /// The policy requires at least one special character.
    RequireSpecial,
    /// The policy forbids whitespace and the password contains some.
    ContainsWhitespace,
}

impl PolicyViolation {
    /// Returns the stable reason code for this violation.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::MinLength(_) => "min-length",
            Self::MaxLength(_) => "max-length",
            Self::RequireAlpha => "require-alpha",
            Self::RequireNumber => "require-number",
            Self::RequireSpecial => "require-special",
            Self::ContainsWhitespace => "contains-whitespace",
        }
    }
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(min) => write!(f, "min-length ({min})"),
            Self::MaxLength(max) => write!(f, "max-length ({max})"),
            other => f.write_str(other.code()),
        }
    }
}
