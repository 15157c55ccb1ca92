//! In-memory subject store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use janus_broker::storage::SubjectStore;
use janus_core::{BrokerError, BrokerResult, Subject};

/// RwLock-guarded subject store, keyed by subject id.
#[derive(Default)]
pub struct InMemorySubjectStore {
    subjects: RwLock<HashMap<String, Subject>>,
}

impl InMemorySubjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subjects.
    pub async fn len(&self) -> usize {
        self.subjects.read().await.len()
    }

    /// Whether the store holds no subjects.
    pub async fn is_empty(&self) -> bool {
        self.subjects.read().await.is_empty()
    }
}

#[async_trait]
impl SubjectStore for InMemorySubjectStore {
    async fn create(&self, subject: &Subject) -> BrokerResult<()> {
        let mut subjects = self.subjects.write().await;
        if subjects.contains_key(&subject.subject_id) {
            return Err(BrokerError::already_exists("subject", &subject.subject_id));
        }
        subjects.insert(subject.subject_id.clone(), subject.clone());
        Ok(())
    }

    async fn find(&self, subject_id: &str) -> BrokerResult<Option<Subject>> {
        Ok(self.subjects.read().await.get(subject_id).cloned())
    }

    async fn get(&self, subject_id: &str) -> BrokerResult<Subject> {
        self.find(subject_id)
            .await?
            .ok_or_else(|| BrokerError::not_found("subject", subject_id))
    }

    async fn rename(&self, subject_id: &str, username: &str) -> BrokerResult<Subject> {
        let mut subjects = self.subjects.write().await;
        let subject = subjects
            .get_mut(subject_id)
            .ok_or_else(|| BrokerError::not_found("subject", subject_id))?;
        subject.username = username.to_string();
        Ok(subject.clone())
    }

    async fn delete(&self, subject_id: &str) -> BrokerResult<()> {
        self.subjects
            .write()
            .await
            .remove(subject_id)
            .map(|_| ())
            .ok_or_else(|| BrokerError::not_found("subject", subject_id))
    }
}
