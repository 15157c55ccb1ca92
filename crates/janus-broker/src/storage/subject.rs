//! Subject storage trait.

use async_trait::async_trait;

use janus_core::{BrokerResult, Subject};

/// Storage operations for realm-global subjects.
///
/// Subjects are created once, renamed at most, and deleted; there is no
/// general update operation.
#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Create a new subject.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if a subject with the same id exists, or an
    /// error if the storage operation fails.
    async fn create(&self, subject: &Subject) -> BrokerResult<()>;

    /// Find a subject by id.
    ///
    /// Returns `None` if the subject doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(&self, subject_id: &str) -> BrokerResult<Option<Subject>>;

    /// Get a subject by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject doesn't exist, or an error if the
    /// storage operation fails.
    async fn get(&self, subject_id: &str) -> BrokerResult<Subject>;

    /// Rename a subject.
    ///
    /// The only permitted mutation of an existing subject.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject doesn't exist, or an error if the
    /// storage operation fails.
    async fn rename(&self, subject_id: &str, username: &str) -> BrokerResult<Subject>;

    /// Delete a subject.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject doesn't exist, or an error if the
    /// storage operation fails.
    async fn delete(&self, subject_id: &str) -> BrokerResult<()>;
}
