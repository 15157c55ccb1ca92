//! Realm-global subjects.
//!
//! A subject is the logical user behind one or more authority-specific
//! accounts. It is created when the first account for a human is registered
//! and carries only identity-level data; everything protocol-specific lives
//! on the accounts that link to it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::realm::generate_id;

/// Default datetime value for deserialization when the field is missing.
fn default_datetime() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// The kind of principal a subject represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    /// A human user.
    User,
    /// A machine client.
    Client,
}

impl Default for SubjectType {
    fn default() -> Self {
        Self::User
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// A realm-global user, independent of any single authority.
///
/// The `subject_id` is an opaque stable identifier, generated once and never
/// reused. Subjects are never mutated except for renames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    /// Opaque stable identifier.
    pub subject_id: String,

    /// Realm the subject belongs to.
    pub realm: String,

    /// Display / federation key.
    pub username: String,

    /// The kind of principal this subject represents.
    #[serde(default)]
    pub subject_type: SubjectType,

    /// When the subject was created.
    #[serde(default = "default_datetime", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Subject {
    /// Creates a new user subject with a generated id.
    #[must_use]
    pub fn new(realm: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            subject_id: generate_id(),
            realm: realm.into(),
            username: username.into(),
            subject_type: SubjectType::User,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Sets the subject id.
    #[must_use]
    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = subject_id.into();
        self
    }

    /// Sets the subject type.
    #[must_use]
    pub fn with_subject_type(mut self, subject_type: SubjectType) -> Self {
        self.subject_type = subject_type;
        self
    }

    /// Returns `true` if the subject represents a human user.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.subject_type == SubjectType::User
    }
}
