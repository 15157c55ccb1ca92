//! Provider configuration snapshots.
//!
//! A [`ProviderConfig`] is an immutable snapshot passed into the services at
//! construction time. Runtime reconfiguration works by building a new
//! snapshot and rebuilding the services on top of it, never by mutating a
//! shared config in place.

use std::sync::Arc;

use time::Duration;

use crate::policy::PasswordPolicy;

/// Capability flag names, as surfaced in `CapabilityDisabled` errors.
pub mod capabilities {
    pub const REGISTRATION: &str = "enableRegistration";
    pub const UPDATE: &str = "enableUpdate";
    pub const DELETE: &str = "enableDelete";
    pub const PASSWORD_SET: &str = "enablePasswordSet";
    pub const PASSWORD_RESET: &str = "enablePasswordReset";
}

/// Configuration for one identity provider within a realm.
///
/// Boolean capability flags gate the operations an authority is allowed to
/// perform; numeric values bound the lifetime of security keys.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Authority this provider belongs to (e.g., "internal", "oidc").
    pub authority: String,

    /// Unique id of this provider instance within the realm.
    pub provider_id: String,

    /// Realm this provider serves.
    pub realm: String,

    /// Storage partition for accounts. Defaults to the realm.
    pub repository_id: String,

    /// Whether new identities may be registered through this provider.
    pub enable_registration: bool,

    /// Whether existing identities may be updated.
    pub enable_update: bool,

    /// Whether identities may be deleted.
    pub enable_delete: bool,

    /// Whether passwords may be set directly.
    pub enable_password_set: bool,

    /// Whether the two-phase password reset flow is available.
    pub enable_password_reset: bool,

    /// Whether accounts must confirm their email before being considered
    /// confirmed.
    pub confirmation_required: bool,

    /// Whether accounts from this provider may be linked to existing
    /// subjects through shared verified attributes (email).
    pub linkable: bool,

    /// How long an issued confirmation key stays valid.
    pub confirmation_validity: Duration,

    /// How long an issued reset key stays valid.
    pub reset_validity: Duration,

    /// Password strength requirements.
    pub password_policy: PasswordPolicy,
}

impl ProviderConfig {
    /// Creates a configuration for the internal authority with default
    /// capabilities: everything enabled, confirmation not required,
    /// accounts linkable.
    #[must_use]
    pub fn internal(realm: impl Into<String>) -> Self {
        let realm = realm.into();
        Self {
            authority: "internal".to_string(),
            provider_id: format!("internal-{realm}"),
            repository_id: realm.clone(),
            realm,
            enable_registration: true,
            enable_update: true,
            enable_delete: true,
            enable_password_set: true,
            enable_password_reset: true,
            confirmation_required: false,
            linkable: true,
            confirmation_validity: Duration::hours(24),
            reset_validity: Duration::hours(1),
            password_policy: PasswordPolicy::default(),
        }
    }

    /// Sets the authority id.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Sets the provider id.
    #[must_use]
    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    /// Sets the repository id (storage partition).
    #[must_use]
    pub fn with_repository_id(mut self, repository_id: impl Into<String>) -> Self {
        self.repository_id = repository_id.into();
        self
    }

    /// Enables or disables registration.
    #[must_use]
    pub fn with_registration(mut self, enabled: bool) -> Self {
        self.enable_registration = enabled;
        self
    }

    /// Enables or disables identity updates.
    #[must_use]
    pub fn with_update(mut self, enabled: bool) -> Self {
        self.enable_update = enabled;
        self
    }

    /// Enables or disables identity deletion.
    #[must_use]
    pub fn with_delete(mut self, enabled: bool) -> Self {
        self.enable_delete = enabled;
        self
    }

    /// Enables or disables direct password setting.
    #[must_use]
    pub fn with_password_set(mut self, enabled: bool) -> Self {
        self.enable_password_set = enabled;
        self
    }

    /// Enables or disables the password reset flow.
    #[must_use]
    pub fn with_password_reset(mut self, enabled: bool) -> Self {
        self.enable_password_reset = enabled;
        self
    }

    /// Requires email confirmation for new accounts.
    #[must_use]
    pub fn with_confirmation_required(mut self, required: bool) -> Self {
        self.confirmation_required = required;
        self
    }

    /// Permits or forbids cross-account linking by verified email.
    #[must_use]
    pub fn with_linkable(mut self, linkable: bool) -> Self {
        self.linkable = linkable;
        self
    }

    /// Sets the confirmation key validity window.
    #[must_use]
    pub fn with_confirmation_validity(mut self, validity: Duration) -> Self {
        self.confirmation_validity = validity;
        self
    }

    /// Sets the reset key validity window.
    #[must_use]
    pub fn with_reset_validity(mut self, validity: Duration) -> Self {
        self.reset_validity = validity;
        self
    }

    /// Sets the password policy.
    #[must_use]
    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    /// Freezes the configuration into a shared snapshot.
    #[must_use]
    pub fn snapshot(self) -> Arc<Self> {
        Arc::new(self)
    }
}
