//! Subject resolution.
//!
//! Answers "which broker-level subject owns this account" both by account
//! identifier and, when the provider permits linking, by verified email
//! address.

use std::sync::Arc;

use janus_core::{BrokerError, BrokerResult, Subject};

use crate::config::ProviderConfig;
use crate::storage::{AccountStore, SubjectStore};

/// Resolves accounts to broker subjects within one provider partition.
pub struct SubjectResolverService {
    accounts: Arc<dyn AccountStore>,
    subjects: Arc<dyn SubjectStore>,
    config: Arc<ProviderConfig>,
}

impl SubjectResolverService {
    /// Creates a resolver over the given stores and configuration.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        subjects: Arc<dyn SubjectStore>,
        config: Arc<ProviderConfig>,
    ) -> Self {
        Self {
            accounts,
            subjects,
            config,
        }
    }

    async fn load_subject(&self, subject_id: &str) -> BrokerResult<Option<Subject>> {
        let subject = self.subjects.find(subject_id).await?;
        if subject.is_none() {
            tracing::warn!(subject_id = %subject_id, "account links to a missing subject");
        }
        Ok(subject)
    }

    /// Resolves the subject linked to an account.
    ///
    /// Returns `None` when the account does not exist or is not linked to
    /// a subject.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn resolve_by_account_id(&self, account_id: &str) -> BrokerResult<Option<Subject>> {
        let account = self
            .accounts
            .find_by_id(&self.config.repository_id, account_id)
            .await?;
        match account.and_then(|account| account.subject_id) {
            Some(subject_id) => self.load_subject(&subject_id).await,
            None => Ok(None),
        }
    }

    /// Resolves the subject owning a verified email address.
    ///
    /// Only linked accounts with a verified matching email participate.
    /// When the provider is not linkable this always resolves to `None`:
    /// email ownership is not trusted as a linking signal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the verified address maps to more than
    /// one distinct subject, `Storage` on backend failure.
    pub async fn resolve_by_email_address(&self, email: &str) -> BrokerResult<Option<Subject>> {
        if !self.config.linkable {
            return Ok(None);
        }
        if email.is_empty() {
            return Ok(None);
        }

        let accounts = self
            .accounts
            .find_by_email(&self.config.repository_id, email)
            .await?;

        let mut resolved: Option<String> = None;
        for account in accounts {
            if !account.email_verified {
                continue;
            }
            let Some(subject_id) = account.subject_id else {
                continue;
            };
            match &resolved {
                None => resolved = Some(subject_id),
                Some(existing) if *existing == subject_id => {}
                Some(existing) => {
                    tracing::warn!(
                        email = %email,
                        first = %existing,
                        second = %subject_id,
                        "verified email maps to multiple subjects"
                    );
                    return Err(BrokerError::invalid_input("ambiguous-email"));
                }
            }
        }
        match resolved {
            Some(subject_id) => self.load_subject(&subject_id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::tests::{MemAccountStore, MemSubjectStore};
    use crate::storage::{Account, AccountStore, SubjectStore};

    struct Fixture {
        accounts: Arc<MemAccountStore>,
        subjects: Arc<MemSubjectStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                accounts: Arc::new(MemAccountStore::new()),
                subjects: Arc::new(MemSubjectStore::new()),
            }
        }

        fn resolver(&self, config: ProviderConfig) -> SubjectResolverService {
            SubjectResolverService::new(
                self.accounts.clone(),
                self.subjects.clone(),
                config.snapshot(),
            )
        }

        async fn seed_subject(&self, subject_id: &str) {
            let subject = Subject::new("acme", subject_id).with_subject_id(subject_id);
            self.subjects.create(&subject).await.unwrap();
        }

        async fn seed_account(&self, account: Account) {
            self.accounts.create(&account).await.unwrap();
        }
    }

    fn linked(account_id: &str, email: &str, subject_id: &str, verified: bool) -> Account {
        Account::new("acme", account_id, "acme")
            .with_email(email)
            .with_email_verified(verified)
            .with_subject_id(subject_id)
    }

    #[tokio::test]
    async fn test_resolve_by_account_id() {
        let fixture = Fixture::new();
        fixture.seed_subject("subj-1").await;
        fixture
            .seed_account(linked("alice", "a@x.com", "subj-1", true))
            .await;
        fixture
            .seed_account(Account::new("acme", "bob", "acme"))
            .await;
        let resolver = fixture.resolver(ProviderConfig::internal("acme"));

        let subject = resolver.resolve_by_account_id("alice").await.unwrap();
        assert_eq!(subject.unwrap().subject_id, "subj-1");
        // Unlinked and unknown accounts both resolve to nothing.
        assert!(resolver.resolve_by_account_id("bob").await.unwrap().is_none());
        assert!(resolver
            .resolve_by_account_id("nobody")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_dangling_link_resolves_to_none() {
        let fixture = Fixture::new();
        fixture
            .seed_account(linked("alice", "a@x.com", "gone", true))
            .await;
        let resolver = fixture.resolver(ProviderConfig::internal("acme"));

        assert!(resolver
            .resolve_by_account_id("alice")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resolve_by_email_requires_verification_and_link() {
        let fixture = Fixture::new();
        fixture.seed_subject("subj-1").await;
        fixture
            .seed_account(linked("alice", "a@x.com", "subj-1", false))
            .await;
        fixture
            .seed_account(
                Account::new("acme", "bob", "acme")
                    .with_email("b@x.com")
                    .with_email_verified(true),
            )
            .await;
        let resolver = fixture.resolver(ProviderConfig::internal("acme"));

        // Unverified email does not resolve.
        assert!(resolver
            .resolve_by_email_address("a@x.com")
            .await
            .unwrap()
            .is_none());
        // Verified but unlinked does not resolve either.
        assert!(resolver
            .resolve_by_email_address("b@x.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resolve_by_email_success() {
        let fixture = Fixture::new();
        fixture.seed_subject("subj-1").await;
        fixture
            .seed_account(linked("alice", "a@x.com", "subj-1", true))
            .await;
        let resolver = fixture.resolver(ProviderConfig::internal("acme"));

        let subject = resolver.resolve_by_email_address("a@x.com").await.unwrap();
        assert_eq!(subject.unwrap().subject_id, "subj-1");
    }

    #[tokio::test]
    async fn test_resolve_by_email_same_subject_twice_is_fine() {
        let fixture = Fixture::new();
        fixture.seed_subject("subj-1").await;
        fixture
            .seed_account(linked("alice", "a@x.com", "subj-1", true))
            .await;
        fixture
            .seed_account(linked("alice2", "a@x.com", "subj-1", true))
            .await;
        let resolver = fixture.resolver(ProviderConfig::internal("acme"));

        let subject = resolver.resolve_by_email_address("a@x.com").await.unwrap();
        assert_eq!(subject.unwrap().subject_id, "subj-1");
    }

    #[tokio::test]
    async fn test_resolve_by_email_ambiguous() {
        let fixture = Fixture::new();
        fixture.seed_subject("subj-1").await;
        fixture.seed_subject("subj-2").await;
        fixture
            .seed_account(linked("alice", "a@x.com", "subj-1", true))
            .await;
        fixture
            .seed_account(linked("mallory", "a@x.com", "subj-2", true))
            .await;
        let resolver = fixture.resolver(ProviderConfig::internal("acme"));

        let err = resolver
            .resolve_by_email_address("a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::InvalidInput { ref message } if message == "ambiguous-email"));
    }

    #[tokio::test]
    async fn test_unlinkable_provider_never_resolves_email() {
        let fixture = Fixture::new();
        fixture.seed_subject("subj-1").await;
        fixture
            .seed_account(linked("alice", "a@x.com", "subj-1", true))
            .await;
        let resolver = fixture.resolver(ProviderConfig::internal("acme").with_linkable(false));

        assert!(resolver
            .resolve_by_email_address("a@x.com")
            .await
            .unwrap()
            .is_none());
    }
}
