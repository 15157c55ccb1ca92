//! In-memory storage backend for the Janus identity broker.
//!
//! This crate implements the storage traits from `janus-broker` over
//! `tokio::sync::RwLock`-guarded hash maps. It backs embedded deployments
//! and the integration test suites; production realms use a durable
//! backend behind the same traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use janus_db_memory::{InMemoryAccountStore, InMemorySubjectStore, InMemoryAttributeStore};
//!
//! let accounts = Arc::new(InMemoryAccountStore::new());
//! let subjects = Arc::new(InMemorySubjectStore::new());
//! let attributes = Arc::new(InMemoryAttributeStore::new());
//! ```

mod account;
mod attribute;
mod subject;

pub use account::InMemoryAccountStore;
pub use attribute::InMemoryAttributeStore;
pub use subject::InMemorySubjectStore;
