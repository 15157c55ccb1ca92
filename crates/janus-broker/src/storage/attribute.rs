//! Attribute set storage trait.

use async_trait::async_trait;

use janus_core::BrokerResult;

use crate::attributes::{AttributeScope, AttributeSet};

/// Storage operations for provider-scoped attribute sets.
///
/// All operations are scoped by `(authority, provider, realm, subject_id)`;
/// a provider can never read or write another provider's sets.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Store a set, replacing any existing set with the same scope and id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn put_set(&self, set: &AttributeSet) -> BrokerResult<()>;

    /// Find a named set.
    ///
    /// Returns `None` if no set with that id exists for the subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_set(
        &self,
        scope: &AttributeScope,
        set_id: &str,
    ) -> BrokerResult<Option<AttributeSet>>;

    /// List every set stored for the subject within the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_by_subject(&self, scope: &AttributeScope) -> BrokerResult<Vec<AttributeSet>>;

    /// Delete one named set. Deleting an absent set is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_set(&self, scope: &AttributeScope, set_id: &str) -> BrokerResult<()>;

    /// Delete every set stored for the subject within the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_by_subject(&self, scope: &AttributeScope) -> BrokerResult<()>;
}
