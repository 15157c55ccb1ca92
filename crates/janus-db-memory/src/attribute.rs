//! In-memory attribute set store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use janus_broker::attributes::{AttributeScope, AttributeSet};
use janus_broker::storage::AttributeStore;
use janus_core::BrokerResult;

/// RwLock-guarded attribute store.
///
/// Sets are grouped per scope so that subject-wide listing and deletion
/// stay a single map operation.
#[derive(Default)]
pub struct InMemoryAttributeStore {
    sets: RwLock<HashMap<AttributeScope, HashMap<String, AttributeSet>>>,
}

impl InMemoryAttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sets across all scopes.
    pub async fn len(&self) -> usize {
        self.sets.read().await.values().map(HashMap::len).sum()
    }
}

#[async_trait]
impl AttributeStore for InMemoryAttributeStore {
    async fn put_set(&self, set: &AttributeSet) -> BrokerResult<()> {
        self.sets
            .write()
            .await
            .entry(set.scope.clone())
            .or_default()
            .insert(set.set_id.clone(), set.clone());
        Ok(())
    }

    async fn find_set(
        &self,
        scope: &AttributeScope,
        set_id: &str,
    ) -> BrokerResult<Option<AttributeSet>> {
        Ok(self
            .sets
            .read()
            .await
            .get(scope)
            .and_then(|sets| sets.get(set_id))
            .cloned())
    }

    async fn list_by_subject(&self, scope: &AttributeScope) -> BrokerResult<Vec<AttributeSet>> {
        let sets = self.sets.read().await;
        let mut listed: Vec<AttributeSet> = sets
            .get(scope)
            .map(|sets| sets.values().cloned().collect())
            .unwrap_or_default();
        listed.sort_by(|a, b| a.set_id.cmp(&b.set_id));
        Ok(listed)
    }

    async fn delete_set(&self, scope: &AttributeScope, set_id: &str) -> BrokerResult<()> {
        let mut sets = self.sets.write().await;
        if let Some(scoped) = sets.get_mut(scope) {
            scoped.remove(set_id);
            if scoped.is_empty() {
                sets.remove(scope);
            }
        }
        Ok(())
    }

    async fn delete_by_subject(&self, scope: &AttributeScope) -> BrokerResult<()> {
        self.sets.write().await.remove(scope);
        Ok(())
    }
}
