//! Request/response types of the identity provider SPI.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use janus_core::{BrokerError, BrokerResult};

use crate::attributes::AttributeSet;
use crate::storage::Account;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex must compile")
});

/// Validates the shape of an email address.
///
/// # Errors
///
/// Returns `InvalidInput` when the address does not look like an email.
pub fn validate_email(email: &str) -> BrokerResult<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(BrokerError::invalid_input(format!(
            "invalid email address: {email}"
        )))
    }
}

/// Data supplied when registering a new identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Username; becomes the authority-local account id.
    pub username: String,

    /// Email address; required when the provider mandates confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    /// Preferred language tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Optional initial password, validated against the provider policy.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl RegistrationRequest {
    /// Creates a registration request for the given username.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the given name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the family name.
    #[must_use]
    pub fn with_surname(mut self, surname: impl Into<String>) -> Self {
        self.surname = Some(surname.into());
        self
    }

    /// Sets the preferred language.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Sets the initial password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Profile fields an identity update may change.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl AccountProfile {
    /// Creates an empty profile update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the given name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the family name.
    #[must_use]
    pub fn with_surname(mut self, surname: impl Into<String>) -> Self {
        self.surname = Some(surname.into());
        self
    }

    /// Sets the preferred language.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

/// The raw claim bag produced by an authority's authentication step.
///
/// This is what an authority hands to `convert_principal` after it has
/// verified the credential by its own protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedPrincipal {
    /// Authority that authenticated the principal.
    pub authority: String,

    /// Authority-local account key.
    pub account_id: String,

    /// Subject the authority believes this principal maps to, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// Display name reported by the authority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Raw authority-specific claims.
    #[serde(default)]
    pub claims: HashMap<String, serde_json::Value>,
}

impl AuthenticatedPrincipal {
    /// Creates a principal for the given authority and account key.
    #[must_use]
    pub fn new(authority: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            account_id: account_id.into(),
            subject_id: None,
            name: None,
            claims: HashMap::new(),
        }
    }

    /// Sets the expected subject.
    #[must_use]
    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a raw claim.
    #[must_use]
    pub fn with_claim(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.claims.insert(key.into(), value);
        self
    }
}

/// The assembled identity returned to authority-agnostic callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Authority that owns the account.
    pub authority: String,

    /// Provider instance that assembled the identity.
    pub provider_id: String,

    /// Realm boundary.
    pub realm: String,

    /// Subject the account is bound to, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// The underlying account.
    pub account: Account,

    /// Attribute sets extracted from the account.
    pub attribute_sets: Vec<AttributeSet>,
}

impl Identity {
    /// Returns the authority-local account key.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account.account_id
    }
}
