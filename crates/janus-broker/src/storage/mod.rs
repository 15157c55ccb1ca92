//! Storage traits for identity broker data.
//!
//! This module defines the storage interfaces the broker consumes:
//!
//! - [`AccountStore`] - authority-local accounts
//! - [`SubjectStore`] - realm-global subjects
//! - [`AttributeStore`] - provider-scoped attribute sets
//!
//! Implementations are provided in separate crates:
//!
//! - `janus-db-memory` - in-memory backend for embedding and tests

pub mod account;
pub mod attribute;
pub mod subject;

pub use account::{Account, AccountStatus, AccountStore};
pub use attribute::AttributeStore;
pub use subject::SubjectStore;
