//! # janus-core
//!
//! Core domain types for the Janus multi-tenant identity broker.
//!
//! This crate defines the entities every authority shares:
//!
//! - [`Subject`] - the realm-global logical user
//! - realm slug validation helpers
//! - the [`BrokerError`] taxonomy used across all broker crates
//!
//! Authority-specific types (accounts, credentials, attribute sets) live in
//! `janus-broker`.

pub mod error;
pub mod realm;
pub mod subject;

pub use error::{BrokerError, BrokerResult, PolicyViolation};
pub use realm::{generate_id, is_valid_slug, validate_slug};
pub use subject::{Subject, SubjectType};
