//! End-to-end lifecycle tests over the in-memory backend.
//!
//! These wire the internal provider against real stores and walk the flows
//! a broker front end would drive: registration, confirmation, password
//! reset, attribute management and subject deletion.

use std::sync::Arc;

use janus_broker::prelude::*;
use janus_broker::{AttributeMap, SET_EMAIL};
use janus_core::BrokerError;
use janus_db_memory::{InMemoryAccountStore, InMemoryAttributeStore, InMemorySubjectStore};
use janus_notifications::MemoryNotifier;

struct Broker {
    accounts: Arc<InMemoryAccountStore>,
    subjects: Arc<InMemorySubjectStore>,
    attributes: Arc<InMemoryAttributeStore>,
    notifier: Arc<MemoryNotifier>,
    provider: Arc<InternalIdentityProvider>,
    registry: ProviderRegistry,
}

fn broker(config: ProviderConfig) -> Broker {
    let accounts = Arc::new(InMemoryAccountStore::new());
    let subjects = Arc::new(InMemorySubjectStore::new());
    let attributes = Arc::new(InMemoryAttributeStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let provider = Arc::new(InternalIdentityProvider::new(
        accounts.clone(),
        subjects.clone(),
        attributes.clone(),
        notifier.clone(),
        config.snapshot(),
    ));
    let mut registry = ProviderRegistry::new();
    registry.register(provider.clone()).unwrap();
    Broker {
        accounts,
        subjects,
        attributes,
        notifier,
        provider,
        registry,
    }
}

fn registration(username: &str, email: &str) -> RegistrationRequest {
    RegistrationRequest::new(username)
        .with_email(email)
        .with_name("Alice")
        .with_surname("Doe")
        .with_password("s3cret-pass1")
}

#[tokio::test]
async fn registration_with_confirmation_flow() {
    let broker = broker(ProviderConfig::internal("acme").with_confirmation_required(true));

    let identity = broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();
    assert!(!identity.account.confirmed);
    assert!(!identity.account.email_verified);
    let key = identity.account.confirmation_key.clone().unwrap();
    assert_eq!(broker.notifier.sent_count(), 1);

    // The unconfirmed account can already authenticate and be converted.
    assert!(broker
        .provider
        .credentials()
        .verify_password("alice", "s3cret-pass1")
        .await
        .unwrap());
    let principal = AuthenticatedPrincipal::new("internal", "alice");
    broker
        .provider
        .convert_principal(&principal, None)
        .await
        .unwrap();

    // Email resolution stays empty until the address is verified.
    assert_eq!(
        broker
            .provider
            .resolver()
            .resolve_by_email_address("alice@example.com")
            .await
            .unwrap(),
        None
    );

    let confirmed = broker
        .provider
        .credentials()
        .confirm_account(&key)
        .await
        .unwrap();
    assert!(confirmed.confirmed);
    assert!(confirmed.email_verified);

    assert_eq!(
        broker
            .provider
            .resolver()
            .resolve_by_email_address("alice@example.com")
            .await
            .unwrap()
            .map(|subject| subject.subject_id),
        identity.subject_id
    );
}

#[tokio::test]
async fn password_reset_flow() {
    let broker = broker(ProviderConfig::internal("acme"));
    broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();

    // Two requests: only the latest key is live.
    let first = broker
        .provider
        .credentials()
        .request_reset("alice")
        .await
        .unwrap();
    let stale_key = first.reset_key.clone().unwrap();
    let second = broker
        .provider
        .credentials()
        .request_reset("alice")
        .await
        .unwrap();
    let live_key = second.reset_key.clone().unwrap();
    assert_eq!(broker.notifier.sent_count(), 2);

    let err = broker
        .provider
        .credentials()
        .confirm_reset(&stale_key)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidInput { .. }));

    let account = broker
        .provider
        .credentials()
        .confirm_reset(&live_key)
        .await
        .unwrap();
    assert!(account.change_on_first_access);
    assert!(!broker
        .provider
        .credentials()
        .verify_password("alice", "s3cret-pass1")
        .await
        .unwrap());

    // The user picks a new password and the forced-change flag clears.
    let account = broker
        .provider
        .credentials()
        .set_password("alice", "n3w-secret-9", false)
        .await
        .unwrap();
    assert!(!account.change_on_first_access);
    assert!(broker
        .provider
        .credentials()
        .verify_password("alice", "n3w-secret-9")
        .await
        .unwrap());
}

#[tokio::test]
async fn attribute_sets_round_trip() {
    let broker = broker(ProviderConfig::internal("acme"));
    let identity = broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();
    let subject_id = identity.subject_id.clone().unwrap();

    // Extracted sets come straight from the account.
    let email_set = identity
        .attribute_sets
        .iter()
        .find(|set| set.set_id == SET_EMAIL)
        .unwrap();
    assert_eq!(
        email_set.get("email"),
        Some(&serde_json::json!("alice@example.com"))
    );

    // Persisted sets are validated and replaced wholesale.
    let mut attributes = AttributeMap::new();
    attributes.insert("email".to_string(), serde_json::json!("alt@example.com"));
    attributes.insert("rogue".to_string(), serde_json::json!("dropped"));
    let stored = broker
        .provider
        .attributes()
        .put(&subject_id, SET_EMAIL, attributes)
        .await
        .unwrap();
    assert!(stored.get("rogue").is_none());

    let found = broker
        .provider
        .attributes()
        .find(&subject_id, SET_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get("email"), Some(&serde_json::json!("alt@example.com")));

    let err = broker
        .provider
        .attributes()
        .put(&subject_id, "no-such-set", AttributeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidInput { .. }));

    broker
        .provider
        .attributes()
        .delete(&subject_id, Some(SET_EMAIL))
        .await
        .unwrap();
    assert!(broker
        .provider
        .attributes()
        .find(&subject_id, SET_EMAIL)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn attribute_put_is_idempotent_and_never_merges() {
    let broker = broker(ProviderConfig::internal("acme"));
    let identity = broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();
    let subject_id = identity.subject_id.clone().unwrap();

    let mut attributes = AttributeMap::new();
    attributes.insert("email".to_string(), serde_json::json!("alt@example.com"));
    attributes.insert("email_verified".to_string(), serde_json::json!(true));

    // Re-applying the same input changes nothing.
    let first = broker
        .provider
        .attributes()
        .put(&subject_id, SET_EMAIL, attributes.clone())
        .await
        .unwrap();
    let second = broker
        .provider
        .attributes()
        .put(&subject_id, SET_EMAIL, attributes.clone())
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(second.attributes, attributes);
    let stored = broker
        .provider
        .attributes()
        .find(&subject_id, SET_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.attributes, attributes);

    // A put with fewer fields drops the omitted ones, it does not merge.
    let mut fewer = AttributeMap::new();
    fewer.insert("email".to_string(), serde_json::json!("alt@example.com"));
    broker
        .provider
        .attributes()
        .put(&subject_id, SET_EMAIL, fewer)
        .await
        .unwrap();
    let stored = broker
        .provider
        .attributes()
        .find(&subject_id, SET_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.get("email_verified").is_none());
    assert!(stored.get("email").is_some());
}

#[tokio::test]
async fn expired_reset_key_is_rejected() {
    let broker = broker(
        ProviderConfig::internal("acme").with_reset_validity(time::Duration::seconds(-1)),
    );
    broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();

    let account = broker
        .provider
        .credentials()
        .request_reset("alice")
        .await
        .unwrap();
    let key = account.reset_key.clone().unwrap();

    let err = broker
        .provider
        .credentials()
        .confirm_reset(&key)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidInput { .. }));

    // The old password still verifies: an expired key changed nothing.
    assert!(broker
        .provider
        .credentials()
        .verify_password("alice", "s3cret-pass1")
        .await
        .unwrap());
}

#[tokio::test]
async fn lock_and_status_transitions() {
    let broker = broker(ProviderConfig::internal("acme"));
    broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();

    let locked = broker.provider.accounts().lock("alice").await.unwrap();
    assert!(locked.is_locked());
    let unlocked = broker.provider.accounts().unlock("alice").await.unwrap();
    assert!(unlocked.is_active());

    // An inactive account rejects every mutation until activated.
    broker.provider.accounts().deactivate("alice").await.unwrap();
    let err = broker
        .provider
        .update_identity("alice", AccountProfile::new().with_name("Alicia"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::IllegalState { .. }));
    let err = broker
        .provider
        .credentials()
        .request_reset("alice")
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::IllegalState { .. }));

    broker.provider.accounts().activate("alice").await.unwrap();
    broker
        .provider
        .update_identity("alice", AccountProfile::new().with_name("Alicia"))
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_identity_cleans_attributes() {
    let broker = broker(ProviderConfig::internal("acme"));
    let identity = broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();
    let subject_id = identity.subject_id.clone().unwrap();

    let mut attributes = AttributeMap::new();
    attributes.insert("email".to_string(), serde_json::json!("alice@example.com"));
    broker
        .provider
        .attributes()
        .put(&subject_id, SET_EMAIL, attributes)
        .await
        .unwrap();
    assert_eq!(broker.attributes.len().await, 1);

    broker.provider.delete_identity("alice").await.unwrap();
    assert!(broker.accounts.is_empty().await);
    assert_eq!(broker.attributes.len().await, 0);
}

#[tokio::test]
async fn subject_deletion_cascades_across_accounts() {
    let broker = broker(ProviderConfig::internal("acme"));
    let identity = broker
        .provider
        .register(None, registration("alice", "alice@example.com"))
        .await
        .unwrap();
    let subject_id = identity.subject_id.clone().unwrap();

    // Verify the email, then register a second account linking to the same
    // subject through it.
    let mut account = broker
        .provider
        .accounts()
        .get_by_account_id("alice")
        .await
        .unwrap();
    account.email_verified = true;
    broker.accounts.update(&account).await.unwrap();
    let second = broker
        .provider
        .register(
            None,
            RegistrationRequest::new("alice-work")
                .with_email("alice@example.com")
                .with_password("s3cret-pass2"),
        )
        .await
        .unwrap();
    assert_eq!(second.subject_id.as_deref(), Some(subject_id.as_str()));
    assert_eq!(broker.subjects.len().await, 1);

    broker
        .registry
        .delete_subject(broker.subjects.as_ref(), &subject_id)
        .await
        .unwrap();

    assert!(broker.subjects.is_empty().await);
    // Accounts survive the cascade but are orphaned.
    for account_id in ["alice", "alice-work"] {
        let account = broker
            .provider
            .accounts()
            .get_by_account_id(account_id)
            .await
            .unwrap();
        assert!(!account.is_linked());
    }
    assert_eq!(
        broker
            .provider
            .resolver()
            .resolve_by_email_address("alice@example.com")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn ambiguous_email_is_rejected() {
    let broker = broker(ProviderConfig::internal("acme"));
    for (username, subject) in [("alice", "subj-1"), ("mallory", "subj-2")] {
        broker
            .accounts
            .create(
                &Account::new("acme", username, "acme")
                    .with_email("shared@example.com")
                    .with_email_verified(true)
                    .with_subject_id(subject),
            )
            .await
            .unwrap();
    }

    let err = broker
        .provider
        .resolver()
        .resolve_by_email_address("shared@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::InvalidInput { ref message } if message == "ambiguous-email"));
}
