//! Account type and storage trait.
//!
//! An account is one authority's record of a principal. The account store is
//! the only shared mutable resource of the broker; implementations must
//! guarantee uniqueness on `(repository_id, account_id)` and execute every
//! mutation as an atomic read-modify-write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use janus_core::BrokerResult;

/// Default datetime value for deserialization when the field is missing.
fn default_datetime() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Lifecycle status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// The account is usable.
    Active,
    /// The account is dormant; the only permitted transition is activation.
    Inactive,
    /// The account is administratively locked.
    Locked,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

/// One authority's record of a principal within a realm.
///
/// `(repository_id, account_id)` is unique; `account_id` is immutable after
/// creation. The account may pre-exist unlinked (`subject_id` empty) and is
/// owned by the subject it links to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Authority-local unique key (e.g., the username).
    pub account_id: String,

    /// Realm-scoped storage partition; by default equals the realm.
    pub repository_id: String,

    /// Realm the account belongs to.
    pub realm: String,

    /// Subject this account is linked to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    /// Lifecycle status.
    pub status: AccountStatus,

    /// Whether the account has been confirmed.
    pub confirmed: bool,

    /// Outstanding confirmation key, if one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_key: Option<String>,

    /// Deadline for the outstanding confirmation key.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub confirmation_deadline: Option<OffsetDateTime>,

    /// Outstanding reset key, if one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_key: Option<String>,

    /// Deadline for the outstanding reset key.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub reset_deadline: Option<OffsetDateTime>,

    /// Argon2 password hash (None for accounts without a local credential).
    ///
    /// Never exposed in plaintext-equivalent form; filter this field out
    /// when exposing accounts through an API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    /// Whether the next authentication must force a password change.
    pub change_on_first_access: bool,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the email address was verified via confirmation.
    pub email_verified: bool,

    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    /// Preferred language tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// When the account was created.
    #[serde(default = "default_datetime", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the account was last updated.
    #[serde(default = "default_datetime", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Account {
    /// Creates a new active, unconfirmed, unlinked account.
    #[must_use]
    pub fn new(
        repository_id: impl Into<String>,
        account_id: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            account_id: account_id.into(),
            repository_id: repository_id.into(),
            realm: realm.into(),
            subject_id: None,
            status: AccountStatus::Active,
            confirmed: false,
            confirmation_key: None,
            confirmation_deadline: None,
            reset_key: None,
            reset_deadline: None,
            password_hash: None,
            change_on_first_access: false,
            email: None,
            email_verified: false,
            name: None,
            surname: None,
            lang: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the linked subject.
    #[must_use]
    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Marks the account confirmed.
    #[must_use]
    pub fn with_confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Marks the email verified.
    #[must_use]
    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
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

    /// Returns `true` if the account status is ACTIVE.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Returns `true` if the account status is INACTIVE.
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        self.status == AccountStatus::Inactive
    }

    /// Returns `true` if the account status is LOCKED.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.status == AccountStatus::Locked
    }

    /// Returns `true` if the account is linked to a subject.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.subject_id.is_some()
    }

    /// Marks the account as updated now.
    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}

/// Storage operations for accounts.
///
/// Implementations must guarantee uniqueness on `(repository_id,
/// account_id)` and linearize mutations per account; the broker adds no
/// locking layer of its own.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account by its authority-local key.
    ///
    /// Returns `None` if the account doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(
        &self,
        repository_id: &str,
        account_id: &str,
    ) -> BrokerResult<Option<Account>>;

    /// Find all accounts linked to a subject within a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_subject(
        &self,
        repository_id: &str,
        subject_id: &str,
    ) -> BrokerResult<Vec<Account>>;

    /// Find all accounts with the given email within a repository.
    ///
    /// Matches are returned regardless of `email_verified`; trust decisions
    /// filter at the call site.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, repository_id: &str, email: &str) -> BrokerResult<Vec<Account>>;

    /// Find the account holding the given reset key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_reset_key(
        &self,
        repository_id: &str,
        reset_key: &str,
    ) -> BrokerResult<Option<Account>>;

    /// Find the account holding the given confirmation key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_confirmation_key(
        &self,
        repository_id: &str,
        confirmation_key: &str,
    ) -> BrokerResult<Option<Account>>;

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if an account with the same
    /// `(repository_id, account_id)` exists, or an error if the storage
    /// operation fails.
    async fn create(&self, account: &Account) -> BrokerResult<()>;

    /// Update an existing account atomically.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account doesn't exist, or an error if the
    /// storage operation fails.
    async fn update(&self, account: &Account) -> BrokerResult<()>;

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account doesn't exist, or an error if the
    /// storage operation fails.
    async fn delete(&self, repository_id: &str, account_id: &str) -> BrokerResult<()>;
}
