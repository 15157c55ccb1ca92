//! In-memory account store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use janus_broker::storage::{Account, AccountStore};
use janus_core::{BrokerError, BrokerResult};

/// Accounts are unique per `(repository_id, account_id)`.
type AccountKey = (String, String);

/// RwLock-guarded account store.
///
/// Reads take a shared lock and clone out, so returned accounts are
/// snapshots and never alias live store state.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountKey, Account>>,
}

impl InMemoryAccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(repository_id: &str, account_id: &str) -> AccountKey {
        (repository_id.to_string(), account_id.to_string())
    }

    /// Number of stored accounts across all repositories.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Whether the store holds no accounts.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(
        &self,
        repository_id: &str,
        account_id: &str,
    ) -> BrokerResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .get(&Self::key(repository_id, account_id))
            .cloned())
    }

    async fn find_by_subject(
        &self,
        repository_id: &str,
        subject_id: &str,
    ) -> BrokerResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut matched: Vec<Account> = accounts
            .values()
            .filter(|account| {
                account.repository_id == repository_id
                    && account.subject_id.as_deref() == Some(subject_id)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        Ok(matched)
    }

    async fn find_by_email(&self, repository_id: &str, email: &str) -> BrokerResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut matched: Vec<Account> = accounts
            .values()
            .filter(|account| {
                account.repository_id == repository_id && account.email.as_deref() == Some(email)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        Ok(matched)
    }

    async fn find_by_reset_key(
        &self,
        repository_id: &str,
        reset_key: &str,
    ) -> BrokerResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| {
                account.repository_id == repository_id
                    && account.reset_key.as_deref() == Some(reset_key)
            })
            .cloned())
    }

    async fn find_by_confirmation_key(
        &self,
        repository_id: &str,
        confirmation_key: &str,
    ) -> BrokerResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| {
                account.repository_id == repository_id
                    && account.confirmation_key.as_deref() == Some(confirmation_key)
            })
            .cloned())
    }

    async fn create(&self, account: &Account) -> BrokerResult<()> {
        let mut accounts = self.accounts.write().await;
        let key = Self::key(&account.repository_id, &account.account_id);
        if accounts.contains_key(&key) {
            return Err(BrokerError::already_exists("account", &account.account_id));
        }
        accounts.insert(key, account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> BrokerResult<()> {
        let mut accounts = self.accounts.write().await;
        let key = Self::key(&account.repository_id, &account.account_id);
        if !accounts.contains_key(&key) {
            return Err(BrokerError::not_found("account", &account.account_id));
        }
        accounts.insert(key, account.clone());
        Ok(())
    }

    async fn delete(&self, repository_id: &str, account_id: &str) -> BrokerResult<()> {
        self.accounts
            .write()
            .await
            .remove(&Self::key(repository_id, account_id))
            .map(|_| ())
            .ok_or_else(|| BrokerError::not_found("account", account_id))
    }
}
