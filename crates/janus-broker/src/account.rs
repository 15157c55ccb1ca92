//! Account provider.
//!
//! CRUD and status transitions over one authority's accounts within a realm.
//! Every mutation is a fresh read followed by a single atomic store update;
//! the service holds no account state of its own, so concurrent requests to
//! the same account are linearized entirely by the store.

use std::sync::Arc;

use janus_core::{BrokerError, BrokerResult};

use crate::config::ProviderConfig;
use crate::storage::{Account, AccountStatus, AccountStore};
use crate::types::AccountProfile;

/// Account operations for one provider's repository partition.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    config: Arc<ProviderConfig>,
}

impl AccountService {
    /// Creates an account service over the given store and config snapshot.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, config: Arc<ProviderConfig>) -> Self {
        Self { store, config }
    }

    fn repository_id(&self) -> &str {
        &self.config.repository_id
    }

    /// INACTIVE accounts admit no mutation other than activation.
    fn ensure_mutable(account: &Account) -> BrokerResult<()> {
        if account.is_inactive() {
            return Err(BrokerError::illegal_state(format!(
                "account is inactive: {}",
                account.account_id
            )));
        }
        Ok(())
    }

    /// Finds an account by its authority-local key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails; a miss is `None`,
    /// not an error.
    pub async fn find_by_account_id(&self, account_id: &str) -> BrokerResult<Option<Account>> {
        self.store.find_by_id(self.repository_id(), account_id).await
    }

    /// Gets an account by its authority-local key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on a miss.
    pub async fn get_by_account_id(&self, account_id: &str) -> BrokerResult<Account> {
        self.find_by_account_id(account_id)
            .await?
            .ok_or_else(|| BrokerError::not_found("account", account_id))
    }

    /// Lists the accounts linked to a subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn list_by_subject(&self, subject_id: &str) -> BrokerResult<Vec<Account>> {
        self.store
            .find_by_subject(self.repository_id(), subject_id)
            .await
    }

    /// Finds the accounts carrying the given email, verified or not.
    ///
    /// Callers making trust decisions must filter on `email_verified`
    /// themselves; an unverified email is not a resolvable identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn find_by_email(&self, email: &str) -> BrokerResult<Vec<Account>> {
        self.store.find_by_email(self.repository_id(), email).await
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `(repository_id, account_id)` is taken.
    pub async fn create(&self, account: Account) -> BrokerResult<Account> {
        self.store.create(&account).await?;
        Ok(account)
    }

    /// Updates the profile fields of an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on a miss, `IllegalState` if the account is
    /// INACTIVE.
    pub async fn update_profile(
        &self,
        account_id: &str,
        profile: AccountProfile,
    ) -> BrokerResult<Account> {
        let mut account = self.get_by_account_id(account_id).await?;
        Self::ensure_mutable(&account)?;

        if let Some(email) = profile.email {
            // A changed address loses any prior verification.
            if account.email.as_deref() != Some(email.as_str()) {
                account.email_verified = false;
            }
            account.email = Some(email);
        }
        if profile.name.is_some() {
            account.name = profile.name;
        }
        if profile.surname.is_some() {
            account.surname = profile.surname;
        }
        if profile.lang.is_some() {
            account.lang = profile.lang;
        }
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Locks an account: ACTIVE -> LOCKED.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the account is INACTIVE (activate first).
    pub async fn lock(&self, account_id: &str) -> BrokerResult<Account> {
        let mut account = self.get_by_account_id(account_id).await?;
        Self::ensure_mutable(&account)?;
        account.status = AccountStatus::Locked;
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Unlocks an account: LOCKED -> ACTIVE.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the account is INACTIVE (activate first).
    pub async fn unlock(&self, account_id: &str) -> BrokerResult<Account> {
        let mut account = self.get_by_account_id(account_id).await?;
        Self::ensure_mutable(&account)?;
        account.status = AccountStatus::Active;
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Activates an account: INACTIVE -> ACTIVE.
    ///
    /// Activation is the one transition an INACTIVE account admits.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the account is LOCKED.
    pub async fn activate(&self, account_id: &str) -> BrokerResult<Account> {
        let mut account = self.get_by_account_id(account_id).await?;
        if account.is_locked() {
            return Err(BrokerError::illegal_state(format!(
                "account is locked: {account_id}"
            )));
        }
        account.status = AccountStatus::Active;
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Deactivates an account: ACTIVE -> INACTIVE.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the account is LOCKED.
    pub async fn deactivate(&self, account_id: &str) -> BrokerResult<Account> {
        let mut account = self.get_by_account_id(account_id).await?;
        if account.is_locked() {
            return Err(BrokerError::illegal_state(format!(
                "account is locked: {account_id}"
            )));
        }
        account.status = AccountStatus::Inactive;
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Links an account to a subject.
    ///
    /// Linking is the explicit commit step after resolution; the resolver
    /// never links on its own.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the account is INACTIVE.
    pub async fn link(&self, account_id: &str, subject_id: &str) -> BrokerResult<Account> {
        let mut account = self.get_by_account_id(account_id).await?;
        Self::ensure_mutable(&account)?;
        account.subject_id = Some(subject_id.to_string());
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on a miss.
    pub async fn delete(&self, account_id: &str) -> BrokerResult<()> {
        self.store.delete(self.repository_id(), account_id).await
    }

    /// Clears the subject reference on every account owned by the subject.
    ///
    /// Used by subject deletion: the cascade removes references, it does not
    /// delete the accounts themselves. Bypasses the INACTIVE guard since the
    /// referenced subject no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub async fn unlink_for_subject(&self, subject_id: &str) -> BrokerResult<()> {
        let accounts = self.list_by_subject(subject_id).await?;
        for mut account in accounts {
            account.subject_id = None;
            account.touch();
            self.store.update(&account).await?;
        }
        Ok(())
    }
}
