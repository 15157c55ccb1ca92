//! Identity providers and the provider registry.
//!
//! An [`IdentityProvider`] is the authority-facing composition of the
//! account, credential, resolver and attribute services for one configured
//! provider instance. [`InternalIdentityProvider`] is the username/password
//! authority backed entirely by broker-owned storage; federated authorities
//! implement the same trait over their own upstream.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use janus_core::{BrokerError, BrokerResult, Subject};
use janus_notifications::Notifier;

use crate::account::AccountService;
use crate::attributes::AttributePipeline;
use crate::config::{ProviderConfig, capabilities};
use crate::credentials::CredentialsService;
use crate::resolver::SubjectResolverService;
use crate::storage::{Account, AccountStore, AttributeStore, SubjectStore};
use crate::types::{
    AccountProfile, AuthenticatedPrincipal, Identity, RegistrationRequest, validate_email,
};

/// Authority name of the built-in username/password provider.
pub const AUTHORITY_INTERNAL: &str = "internal";

/// One configured identity provider within a realm.
///
/// All identifiers are authority-local; callers obtain realm-global
/// subjects only through the resolver or an assembled [`Identity`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The authority this provider speaks for.
    fn authority(&self) -> &str;

    /// The provider instance id within the realm.
    fn provider_id(&self) -> &str;

    /// The realm this provider serves.
    fn realm(&self) -> &str;

    /// The immutable configuration snapshot.
    fn config(&self) -> &ProviderConfig;

    /// Account lifecycle operations.
    fn accounts(&self) -> &AccountService;

    /// Credential lifecycle operations.
    fn credentials(&self) -> &CredentialsService;

    /// Subject resolution.
    fn resolver(&self) -> &SubjectResolverService;

    /// Attribute extraction and persisted sets.
    fn attributes(&self) -> &AttributePipeline;

    /// Registers a new identity with this authority.
    ///
    /// When `subject_id` is given the new account attaches to that existing
    /// subject; otherwise a subject is found through a verified email link
    /// or freshly created.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityDisabled` when registration is off,
    /// `InvalidInput` for a malformed request, `InvalidCredential` for a
    /// policy-violating password, `AlreadyExists` for a taken username,
    /// `NotFound` for an unknown explicit subject.
    async fn register(
        &self,
        subject_id: Option<&str>,
        request: RegistrationRequest,
    ) -> BrokerResult<Identity>;

    /// Converts a principal authenticated by this authority into a broker
    /// identity.
    ///
    /// When `expected_subject_id` is given, the account's link must match
    /// it; a mismatch is rejected rather than silently relinked.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an authority or subject mismatch,
    /// `NotFound` for an unknown account.
    async fn convert_principal(
        &self,
        principal: &AuthenticatedPrincipal,
        expected_subject_id: Option<&str>,
    ) -> BrokerResult<Identity>;

    /// Updates the profile of an existing identity.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityDisabled` when updates are off, `NotFound` for an
    /// unknown account, `IllegalState` for an INACTIVE one.
    async fn update_identity(
        &self,
        account_id: &str,
        profile: AccountProfile,
    ) -> BrokerResult<Identity>;

    /// Deletes an identity and its provider-scoped attribute sets.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityDisabled` when deletes are off, `NotFound` for an
    /// unknown account.
    async fn delete_identity(&self, account_id: &str) -> BrokerResult<()>;

    /// Removes everything this provider holds for a subject.
    ///
    /// Invoked by subject deletion cascades. Unlinks the subject's accounts
    /// and drops its provider-scoped attribute sets regardless of the
    /// delete capability, which gates caller-initiated deletes only.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    async fn purge_subject(&self, subject_id: &str) -> BrokerResult<()>;
}

/// The built-in username/password identity provider.
pub struct InternalIdentityProvider {
    config: Arc<ProviderConfig>,
    accounts: AccountService,
    credentials: CredentialsService,
    resolver: SubjectResolverService,
    attributes: AttributePipeline,
    account_store: Arc<dyn AccountStore>,
    subjects: Arc<dyn SubjectStore>,
}

impl InternalIdentityProvider {
    /// Wires the provider over the given stores and notifier.
    #[must_use]
    pub fn new(
        account_store: Arc<dyn AccountStore>,
        subject_store: Arc<dyn SubjectStore>,
        attribute_store: Arc<dyn AttributeStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<ProviderConfig>,
    ) -> Self {
        Self {
            accounts: AccountService::new(account_store.clone(), config.clone()),
            credentials: CredentialsService::new(account_store.clone(), notifier, config.clone()),
            resolver: SubjectResolverService::new(
                account_store.clone(),
                subject_store.clone(),
                config.clone(),
            ),
            attributes: AttributePipeline::new(attribute_store, config.clone()),
            account_store,
            subjects: subject_store,
            config,
        }
    }

    fn assemble(&self, account: Account) -> Identity {
        let attribute_sets = self.attributes.extract(&account);
        Identity {
            authority: self.config.authority.clone(),
            provider_id: self.config.provider_id.clone(),
            realm: self.config.realm.clone(),
            subject_id: account.subject_id.clone(),
            account,
            attribute_sets,
        }
    }

    fn validate_registration(&self, request: &RegistrationRequest) -> BrokerResult<()> {
        if request.username.trim().is_empty() {
            return Err(BrokerError::invalid_input("username is required"));
        }
        match request.email.as_deref() {
            Some(email) => validate_email(email)?,
            None if self.config.confirmation_required => {
                return Err(BrokerError::invalid_input(
                    "email is required when confirmation is enabled",
                ));
            }
            None => {}
        }
        if let Some(password) = request.password.as_deref() {
            self.config
                .password_policy
                .validate(password)
                .map_err(BrokerError::invalid_credential)?;
        }
        Ok(())
    }

    /// Finds the subject to attach a new registration to, creating one when
    /// no verified email links to an existing subject. The flag reports
    /// whether the subject was created here, so a failed registration knows
    /// what to undo.
    async fn attach_subject(
        &self,
        subject_id: Option<&str>,
        request: &RegistrationRequest,
    ) -> BrokerResult<(Subject, bool)> {
        if let Some(subject_id) = subject_id {
            return Ok((self.subjects.get(subject_id).await?, false));
        }
        if let Some(email) = request.email.as_deref() {
            if let Some(subject) = self.resolver.resolve_by_email_address(email).await? {
                tracing::debug!(
                    subject_id = %subject.subject_id,
                    username = %request.username,
                    "linking new registration to existing subject"
                );
                return Ok((subject, false));
            }
        }
        let subject = Subject::new(&self.config.realm, &request.username);
        self.subjects.create(&subject).await?;
        Ok((subject, true))
    }

    async fn undo_registration(&self, account_id: &str, subject: &Subject, created_here: bool) {
        if let Err(error) = self
            .account_store
            .delete(&self.config.repository_id, account_id)
            .await
        {
            tracing::warn!(account_id = %account_id, error = %error, "registration cleanup failed");
        }
        if created_here {
            if let Err(error) = self.subjects.delete(&subject.subject_id).await {
                tracing::warn!(
                    subject_id = %subject.subject_id,
                    error = %error,
                    "registration cleanup failed"
                );
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for InternalIdentityProvider {
    fn authority(&self) -> &str {
        &self.config.authority
    }

    fn provider_id(&self) -> &str {
        &self.config.provider_id
    }

    fn realm(&self) -> &str {
        &self.config.realm
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    fn credentials(&self) -> &CredentialsService {
        &self.credentials
    }

    fn resolver(&self) -> &SubjectResolverService {
        &self.resolver
    }

    fn attributes(&self) -> &AttributePipeline {
        &self.attributes
    }

    async fn register(
        &self,
        subject_id: Option<&str>,
        request: RegistrationRequest,
    ) -> BrokerResult<Identity> {
        if !self.config.enable_registration {
            return Err(BrokerError::capability_disabled(capabilities::REGISTRATION));
        }
        self.validate_registration(&request)?;

        // Fail fast on a taken username before touching the subject table.
        if self
            .accounts
            .find_by_account_id(&request.username)
            .await?
            .is_some()
        {
            return Err(BrokerError::already_exists("account", &request.username));
        }

        let (subject, created_here) = self.attach_subject(subject_id, &request).await?;

        let mut account = Account::new(
            &self.config.repository_id,
            &request.username,
            &self.config.realm,
        )
        .with_subject_id(&subject.subject_id)
        .with_confirmed(!self.config.confirmation_required);
        if let Some(email) = &request.email {
            account = account.with_email(email);
        }
        if let Some(name) = &request.name {
            account = account.with_name(name);
        }
        if let Some(surname) = &request.surname {
            account = account.with_surname(surname);
        }
        if let Some(lang) = &request.lang {
            account = account.with_lang(lang);
        }

        if let Err(error) = self.accounts.create(account).await {
            if created_here {
                if let Err(cleanup) = self.subjects.delete(&subject.subject_id).await {
                    tracing::warn!(
                        subject_id = %subject.subject_id,
                        error = %cleanup,
                        "registration cleanup failed"
                    );
                }
            }
            return Err(error);
        }

        // Downstream steps compensate by removing what was just created,
        // so a half-registered identity is never left behind.
        let mut account = match request.password.as_deref() {
            Some(password) => {
                match self
                    .credentials
                    .set_password(&request.username, password, false)
                    .await
                {
                    Ok(account) => account,
                    Err(error) => {
                        self.undo_registration(&request.username, &subject, created_here)
                            .await;
                        return Err(error);
                    }
                }
            }
            None => self.accounts.get_by_account_id(&request.username).await?,
        };

        if self.config.confirmation_required {
            account = match self.credentials.request_confirmation(&request.username).await {
                Ok(account) => account,
                Err(error) => {
                    self.undo_registration(&request.username, &subject, created_here)
                        .await;
                    return Err(error);
                }
            };
        }

        tracing::info!(
            account_id = %account.account_id,
            subject_id = %subject.subject_id,
            realm = %self.config.realm,
            "registered new identity"
        );
        Ok(self.assemble(account))
    }

    async fn convert_principal(
        &self,
        principal: &AuthenticatedPrincipal,
        expected_subject_id: Option<&str>,
    ) -> BrokerResult<Identity> {
        if principal.authority != self.config.authority {
            tracing::warn!(
                expected = %self.config.authority,
                got = %principal.authority,
                "principal from a different authority"
            );
            return Err(BrokerError::invalid_input("authority-mismatch"));
        }

        let account = self.accounts.get_by_account_id(&principal.account_id).await?;

        if let Some(expected) = expected_subject_id {
            if account.subject_id.as_deref() != Some(expected) {
                tracing::warn!(
                    account_id = %account.account_id,
                    expected = %expected,
                    "account is not linked to the expected subject"
                );
                return Err(BrokerError::invalid_input("subject-mismatch"));
            }
        }
        Ok(self.assemble(account))
    }

    async fn update_identity(
        &self,
        account_id: &str,
        profile: AccountProfile,
    ) -> BrokerResult<Identity> {
        if !self.config.enable_update {
            return Err(BrokerError::capability_disabled(capabilities::UPDATE));
        }
        let account = self.accounts.update_profile(account_id, profile).await?;
        Ok(self.assemble(account))
    }

    async fn delete_identity(&self, account_id: &str) -> BrokerResult<()> {
        if !self.config.enable_delete {
            return Err(BrokerError::capability_disabled(capabilities::DELETE));
        }
        let account = self.accounts.get_by_account_id(account_id).await?;
        self.accounts.delete(account_id).await?;

        if let Some(subject_id) = account.subject_id.as_deref() {
            // Attribute sets are per subject; drop them only when this was
            // the subject's last account under this provider.
            if self.accounts.list_by_subject(subject_id).await?.is_empty() {
                self.attributes.delete(subject_id, None).await?;
            }
        }
        tracing::info!(account_id = %account_id, "deleted identity");
        Ok(())
    }

    async fn purge_subject(&self, subject_id: &str) -> BrokerResult<()> {
        self.accounts.unlink_for_subject(subject_id).await?;
        self.attributes.delete(subject_id, None).await?;
        Ok(())
    }
}

/// Registry of configured providers, keyed by authority.
///
/// The broker consults the registry to route authority-agnostic requests
/// to the right provider instance.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its authority.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the authority is already taken.
    pub fn register(&mut self, provider: Arc<dyn IdentityProvider>) -> BrokerResult<()> {
        let authority = provider.authority().to_string();
        if self.providers.contains_key(&authority) {
            return Err(BrokerError::already_exists("provider", &authority));
        }
        self.providers.insert(authority, provider);
        Ok(())
    }

    /// Looks up the provider for an authority.
    #[must_use]
    pub fn find(&self, authority: &str) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(authority).cloned()
    }

    /// Looks up the provider for an authority, failing on a miss.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unregistered authority.
    pub fn get(&self, authority: &str) -> BrokerResult<Arc<dyn IdentityProvider>> {
        self.find(authority)
            .ok_or_else(|| BrokerError::not_found("provider", authority))
    }

    /// The registered authorities.
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Removes everything any provider holds for a subject, then deletes
    /// the subject itself.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject doesn't exist, or an error if a
    /// provider purge fails.
    pub async fn delete_subject(
        &self,
        subjects: &dyn SubjectStore,
        subject_id: &str,
    ) -> BrokerResult<()> {
        subjects.get(subject_id).await?;
        for provider in self.providers.values() {
            provider.purge_subject(subject_id).await?;
        }
        subjects.delete(subject_id).await?;
        tracing::info!(subject_id = %subject_id, "deleted subject");
        Ok(())
    }
}
