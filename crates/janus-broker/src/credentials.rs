//! Credential lifecycle service.
//!
//! Password hashing and verification, plus the two-phase expiring-token
//! flows for password reset and account confirmation.
//!
//! # Security
//!
//! - Keys are single-use: consumption clears the key atomically with the
//!   action that consumes it, so a key can never be replayed.
//! - Every key validation failure surfaces as the same generic
//!   `InvalidInput("invalid-key")`: callers cannot distinguish "expired"
//!   from "wrong" from "already consumed".
//! - Plaintext passwords are never logged and never persisted.
//! - Notification delivery is best-effort: a failed send is logged and
//!   swallowed, never rolled back against the already-persisted key.

use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;

use janus_core::{BrokerError, BrokerResult};
use janus_notifications::{Notifier, TEMPLATE_CONFIRMATION, TEMPLATE_RESET};

use crate::config::{ProviderConfig, capabilities};
use crate::hashing;
use crate::keys;
use crate::storage::{Account, AccountStatus, AccountStore};

/// Credential operations for one provider's repository partition.
pub struct CredentialsService {
    store: Arc<dyn AccountStore>,
    notifier: Arc<dyn Notifier>,
    config: Arc<ProviderConfig>,
}

impl CredentialsService {
    /// Creates a credentials service over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<ProviderConfig>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Stored hashes are never exposed in plaintext-equivalent form.
    #[must_use]
    pub fn can_read(&self) -> bool {
        false
    }

    /// Whether passwords may be set directly.
    #[must_use]
    pub fn can_set(&self) -> bool {
        self.config.enable_password_set
    }

    /// Whether the two-phase reset flow is available.
    #[must_use]
    pub fn can_reset(&self) -> bool {
        self.config.enable_password_reset
    }

    fn repository_id(&self) -> &str {
        &self.config.repository_id
    }

    async fn get_account(&self, account_id: &str) -> BrokerResult<Account> {
        self.store
            .find_by_id(self.repository_id(), account_id)
            .await?
            .ok_or_else(|| BrokerError::not_found("account", account_id))
    }

    fn ensure_mutable(account: &Account) -> BrokerResult<()> {
        if account.is_inactive() {
            return Err(BrokerError::illegal_state(format!(
                "account is inactive: {}",
                account.account_id
            )));
        }
        Ok(())
    }

    /// Best-effort notification; failures never propagate into the state
    /// change that triggered the message.
    async fn dispatch(&self, account: &Account, template_id: &str, key: &str, deadline: OffsetDateTime) {
        let Some(email) = account.email.as_deref() else {
            tracing::debug!(
                account_id = %account.account_id,
                template = %template_id,
                "account has no email address, skipping notification"
            );
            return;
        };

        let mut variables = HashMap::new();
        variables.insert(
            "username".to_string(),
            serde_json::json!(account.account_id),
        );
        variables.insert("realm".to_string(), serde_json::json!(account.realm));
        variables.insert("key".to_string(), serde_json::json!(key));
        variables.insert(
            "deadline".to_string(),
            serde_json::json!(deadline.to_string()),
        );

        if let Err(error) = self.notifier.send(email, template_id, &variables).await {
            tracing::warn!(
                account_id = %account.account_id,
                template = %template_id,
                error = %error,
                "notification delivery failed, key remains valid"
            );
        }
    }

    /// Sets the account password.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityDisabled` when password setting is off,
    /// `InvalidCredential` naming the first violated policy rule,
    /// `NotFound` for a missing account, `IllegalState` for an INACTIVE one.
    pub async fn set_password(
        &self,
        account_id: &str,
        password: &str,
        change_on_first_access: bool,
    ) -> BrokerResult<Account> {
        if !self.can_set() {
            return Err(BrokerError::capability_disabled(capabilities::PASSWORD_SET));
        }
        // The policy is re-evaluated on every call so a reloaded config
        // snapshot takes effect immediately.
        self.config
            .password_policy
            .validate(password)
            .map_err(BrokerError::invalid_credential)?;

        let mut account = self.get_account(account_id).await?;
        Self::ensure_mutable(&account)?;

        account.password_hash = Some(hashing::hash_password(password)?);
        account.change_on_first_access = change_on_first_access;
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Verifies a password against the stored hash.
    ///
    /// Accounts without a stored hash never verify. The plaintext is never
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing account.
    pub async fn verify_password(&self, account_id: &str, password: &str) -> BrokerResult<bool> {
        let account = self.get_account(account_id).await?;
        Ok(account
            .password_hash
            .as_deref()
            .is_some_and(|hash| hashing::verify_password(password, hash)))
    }

    /// Issues a fresh reset key for the account.
    ///
    /// Re-entrant: each request invalidates any previously issued key, so
    /// at most one reset token is live per account.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityDisabled` when resets are off, `NotFound` for a
    /// missing account, `IllegalState` for an INACTIVE one.
    pub async fn request_reset(&self, account_id: &str) -> BrokerResult<Account> {
        if !self.can_reset() {
            return Err(BrokerError::capability_disabled(
                capabilities::PASSWORD_RESET,
            ));
        }
        let mut account = self.get_account(account_id).await?;
        Self::ensure_mutable(&account)?;

        let key = keys::generate_key();
        let deadline = OffsetDateTime::now_utc() + self.config.reset_validity;
        account.reset_key = Some(key.clone());
        account.reset_deadline = Some(deadline);
        account.touch();
        self.store.update(&account).await?;

        self.dispatch(&account, TEMPLATE_RESET, &key, deadline).await;
        Ok(account)
    }

    /// Consumes a reset key.
    ///
    /// The key itself is the lookup token. On success the key and deadline
    /// are cleared, the password is replaced with a random value nobody
    /// knows, and the account is flagged to change the password on first
    /// access: it cannot authenticate with a known credential until a
    /// subsequent password-set flow completes.
    ///
    /// # Errors
    ///
    /// Every validation failure (missing, unknown, mismatched, expired or
    /// already consumed key, or an account deactivated since issuance)
    /// collapses into `InvalidInput("invalid-key")`.
    pub async fn confirm_reset(&self, reset_key: &str) -> BrokerResult<Account> {
        if !self.can_reset() {
            return Err(BrokerError::capability_disabled(
                capabilities::PASSWORD_RESET,
            ));
        }
        if reset_key.is_empty() {
            return Err(BrokerError::invalid_key());
        }
        let Some(mut account) = self
            .store
            .find_by_reset_key(self.repository_id(), reset_key)
            .await?
        else {
            return Err(BrokerError::invalid_key());
        };

        // Defense against store bugs: the row must actually carry the key.
        if account.reset_key.as_deref() != Some(reset_key) {
            tracing::warn!(
                account_id = %account.account_id,
                "reset key lookup returned a non-matching account"
            );
            return Err(BrokerError::invalid_key());
        }
        // An INACTIVE account admits no mutation; the key stays stored and
        // becomes consumable again on activation, but the failure stays
        // indistinguishable from any other bad key.
        if account.is_inactive() {
            return Err(BrokerError::invalid_key());
        }
        let Some(deadline) = account.reset_deadline else {
            return Err(BrokerError::invalid_key());
        };
        if deadline < OffsetDateTime::now_utc() {
            return Err(BrokerError::invalid_key());
        }

        // Consume the key atomically with the password replacement.
        account.reset_key = None;
        account.reset_deadline = None;
        account.password_hash = Some(hashing::hash_password(&keys::generate_random_password())?);
        account.change_on_first_access = true;
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }

    /// Issues a fresh confirmation key for the account.
    ///
    /// Re-issuable while the account is unconfirmed; once confirmed, the
    /// transition is final.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing account, `IllegalState` when the
    /// account is already confirmed.
    pub async fn request_confirmation(&self, account_id: &str) -> BrokerResult<Account> {
        let mut account = self.get_account(account_id).await?;
        if account.confirmed {
            return Err(BrokerError::illegal_state(format!(
                "account already confirmed: {account_id}"
            )));
        }

        let key = keys::generate_key();
        let deadline = OffsetDateTime::now_utc() + self.config.confirmation_validity;
        account.confirmation_key = Some(key.clone());
        account.confirmation_deadline = Some(deadline);
        account.touch();
        self.store.update(&account).await?;

        self.dispatch(&account, TEMPLATE_CONFIRMATION, &key, deadline)
            .await;
        Ok(account)
    }

    /// Consumes a confirmation key.
    ///
    /// On success the account becomes confirmed, its email becomes
    /// verified, the key and deadline are cleared, and an INACTIVE account
    /// is activated.
    ///
    /// # Errors
    ///
    /// Every validation failure collapses into `InvalidInput("invalid-key")`,
    /// indistinguishable from the reset-key failures.
    pub async fn confirm_account(&self, confirmation_key: &str) -> BrokerResult<Account> {
        if confirmation_key.is_empty() {
            return Err(BrokerError::invalid_key());
        }
        let Some(mut account) = self
            .store
            .find_by_confirmation_key(self.repository_id(), confirmation_key)
            .await?
        else {
            return Err(BrokerError::invalid_key());
        };

        if account.confirmation_key.as_deref() != Some(confirmation_key) {
            tracing::warn!(
                account_id = %account.account_id,
                "confirmation key lookup returned a non-matching account"
            );
            return Err(BrokerError::invalid_key());
        }
        let Some(deadline) = account.confirmation_deadline else {
            return Err(BrokerError::invalid_key());
        };
        if deadline < OffsetDateTime::now_utc() {
            return Err(BrokerError::invalid_key());
        }

        account.confirmation_key = None;
        account.confirmation_deadline = None;
        account.confirmed = true;
        account.email_verified = true;
        if account.status == AccountStatus::Inactive {
            account.status = AccountStatus::Active;
        }
        account.touch();
        self.store.update(&account).await?;
        Ok(account)
    }
}
