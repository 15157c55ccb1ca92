//! # janus-broker
//!
//! Multi-tenant identity broker core.
//!
//! This crate provides:
//! - Identity provider framework with a pluggable authority SPI
//! - Account lifecycle management (ACTIVE / INACTIVE / LOCKED)
//! - Credential lifecycle with single-use, time-bounded reset and
//!   confirmation keys
//! - Subject resolution, including linkable-gated email resolution
//! - Attribute extraction into typed, provider-scoped sets
//! - The built-in username/password ("internal") authority
//!
//! ## Overview
//!
//! A realm hosts one or more identity providers, each speaking for an
//! authority. Providers manage authority-local accounts and link them to
//! realm-global subjects; callers above the broker only ever see assembled
//! [`Identity`] values and never authority internals.
//!
//! ## Modules
//!
//! - [`account`] - account lifecycle service
//! - [`attributes`] - attribute mappers, sets and the pipeline
//! - [`config`] - provider configuration snapshots
//! - [`credentials`] - password and key lifecycle service
//! - [`hashing`] - Argon2id password hashing
//! - [`keys`] - security key generation
//! - [`policy`] - password policy evaluation
//! - [`provider`] - the provider SPI, internal provider and registry
//! - [`resolver`] - subject resolution
//! - [`storage`] - storage traits consumed by the services
//! - [`types`] - SPI request and response types

pub mod account;
pub mod attributes;
pub mod config;
pub mod credentials;
pub mod hashing;
pub mod keys;
pub mod policy;
pub mod provider;
pub mod resolver;
pub mod storage;
pub mod types;

pub use account::AccountService;
pub use attributes::{
    AttributeMap, AttributeMapper, AttributePipeline, AttributeScope, AttributeSet,
    SET_ACCOUNT_PROFILE, SET_BASIC_PROFILE, SET_EMAIL, SET_OPENID,
};
pub use config::{ProviderConfig, capabilities};
pub use credentials::CredentialsService;
pub use policy::PasswordPolicy;
pub use provider::{
    AUTHORITY_INTERNAL, IdentityProvider, InternalIdentityProvider, ProviderRegistry,
};
pub use resolver::SubjectResolverService;
pub use storage::{Account, AccountStatus, AccountStore, AttributeStore, SubjectStore};
pub use types::{
    AccountProfile, AuthenticatedPrincipal, Identity, RegistrationRequest, validate_email,
};

/// Prelude module for convenient imports.
///
/// ```
/// use janus_broker::prelude::*;
/// ```
pub mod prelude {
    pub use crate::account::AccountService;
    pub use crate::attributes::{AttributePipeline, AttributeSet};
    pub use crate::config::ProviderConfig;
    pub use crate::credentials::CredentialsService;
    pub use crate::policy::PasswordPolicy;
    pub use crate::provider::{
        AUTHORITY_INTERNAL, IdentityProvider, InternalIdentityProvider, ProviderRegistry,
    };
    pub use crate::resolver::SubjectResolverService;
    pub use crate::storage::{Account, AccountStatus, AccountStore, AttributeStore, SubjectStore};
    pub use crate::types::{
        AccountProfile, AuthenticatedPrincipal, Identity, RegistrationRequest,
    };
    pub use janus_core::{BrokerError, BrokerResult, Subject, SubjectType};
}
