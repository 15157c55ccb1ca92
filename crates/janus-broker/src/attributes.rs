//! Attribute pipeline.
//!
//! Maps raw account data into typed, named attribute sets, and manages
//! provider-scoped custom sets. Sets are replaced wholesale on every write:
//! `put` is last-write-wins, never a field-by-field merge.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use janus_core::{BrokerError, BrokerResult};

use crate::config::ProviderConfig;
use crate::storage::{Account, AttributeStore};

/// Ordered key/value content of an attribute set.
pub type AttributeMap = IndexMap<String, serde_json::Value>;

/// Set id for the basic profile attributes (name, surname, username, lang).
pub const SET_BASIC_PROFILE: &str = "basicprofile";

/// Set id for the account identity attributes (realm, repository, status).
pub const SET_ACCOUNT_PROFILE: &str = "accountprofile";

/// Set id for the email attributes.
pub const SET_EMAIL: &str = "email";

/// Set id for the normalized OpenID-style claim set.
pub const SET_OPENID: &str = "openid";

/// Scope of attribute storage: one provider's view of one subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeScope {
    /// Authority the attributes belong to.
    pub authority: String,
    /// Provider instance within the authority.
    pub provider_id: String,
    /// Realm boundary.
    pub realm: String,
    /// Subject the attributes describe.
    pub subject_id: String,
}

impl AttributeScope {
    /// Builds the scope for a subject under the given provider config.
    #[must_use]
    pub fn for_subject(config: &ProviderConfig, subject_id: impl Into<String>) -> Self {
        Self {
            authority: config.authority.clone(),
            provider_id: config.provider_id.clone(),
            realm: config.realm.clone(),
            subject_id: subject_id.into(),
        }
    }
}

/// A named, schema-typed bag of attributes scoped to
/// `(authority, provider, realm, subject, set)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    /// Storage scope.
    #[serde(flatten)]
    pub scope: AttributeScope,

    /// Name of the set.
    pub set_id: String,

    /// Ordered attribute content.
    pub attributes: AttributeMap,
}

impl AttributeSet {
    /// Creates an attribute set.
    #[must_use]
    pub fn new(scope: AttributeScope, set_id: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            scope,
            set_id: set_id.into(),
            attributes,
        }
    }

    /// Gets an attribute value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Returns `true` if the set has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Declares the schema of a named attribute set.
///
/// A mapper validates written content against its declared keys: unknown
/// keys and null values are dropped, declared-but-absent keys are simply
/// omitted.
#[derive(Debug, Clone)]
pub struct AttributeMapper {
    set_id: String,
    keys: Vec<String>,
}

impl AttributeMapper {
    /// Creates a mapper for the named set with the declared keys.
    #[must_use]
    pub fn new(set_id: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            set_id: set_id.into(),
            keys: keys.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// The set id this mapper validates.
    #[must_use]
    pub fn set_id(&self) -> &str {
        &self.set_id
    }

    /// The declared keys, in schema order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Maps raw content onto the declared schema.
    ///
    /// Keys are emitted in schema order; unknown keys and null values are
    /// dropped.
    #[must_use]
    pub fn map(&self, raw: &AttributeMap) -> AttributeMap {
        let mut mapped = AttributeMap::new();
        for key in &self.keys {
            if let Some(value) = raw.get(key) {
                if !value.is_null() {
                    mapped.insert(key.clone(), value.clone());
                }
            }
        }
        mapped
    }
}

fn default_mappers() -> IndexMap<String, AttributeMapper> {
    let mappers = [
        AttributeMapper::new(
            SET_BASIC_PROFILE,
            &["username", "name", "surname", "email", "lang"],
        ),
        AttributeMapper::new(
            SET_ACCOUNT_PROFILE,
            &[
                "realm",
                "repository_id",
                "account_id",
                "status",
                "confirmed",
            ],
        ),
        AttributeMapper::new(SET_EMAIL, &["email", "email_verified"]),
        AttributeMapper::new(
            SET_OPENID,
            &[
                "sub",
                "preferred_username",
                "given_name",
                "family_name",
                "email",
                "email_verified",
                "locale",
            ],
        ),
    ];
    mappers
        .into_iter()
        .map(|m| (m.set_id.clone(), m))
        .collect()
}

/// Inserts a value into the map if present, skipping `None`.
fn put_opt(map: &mut AttributeMap, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), serde_json::json!(value));
    }
}

/// The attribute pipeline for one provider.
///
/// `extract` is a pure function of account fields; `put`/`delete` manage the
/// provider-scoped persisted sets.
pub struct AttributePipeline {
    store: Arc<dyn AttributeStore>,
    config: Arc<ProviderConfig>,
    mappers: IndexMap<String, AttributeMapper>,
}

impl AttributePipeline {
    /// Creates a pipeline with the four built-in set schemas.
    #[must_use]
    pub fn new(store: Arc<dyn AttributeStore>, config: Arc<ProviderConfig>) -> Self {
        Self {
            store,
            config,
            mappers: default_mappers(),
        }
    }

    /// Declares an additional named set for this provider.
    #[must_use]
    pub fn with_mapper(mut self, mapper: AttributeMapper) -> Self {
        self.mappers.insert(mapper.set_id.clone(), mapper);
        self
    }

    /// The set ids this pipeline accepts.
    pub fn set_ids(&self) -> impl Iterator<Item = &str> {
        self.mappers.keys().map(String::as_str)
    }

    /// Extracts the fixed collection of typed sets from an account.
    ///
    /// Deterministic and pure: the same account always yields the same
    /// sets, each independently consumable by downstream claim mapping.
    #[must_use]
    pub fn extract(&self, account: &Account) -> Vec<AttributeSet> {
        // Unlinked accounts are keyed by their own id until a subject exists.
        let subject_id = account
            .subject_id
            .clone()
            .unwrap_or_else(|| account.account_id.clone());
        let scope = AttributeScope::for_subject(&self.config, subject_id);

        let mut basic = AttributeMap::new();
        basic.insert(
            "username".to_string(),
            serde_json::json!(account.account_id),
        );
        put_opt(&mut basic, "name", account.name.as_deref());
        put_opt(&mut basic, "surname", account.surname.as_deref());
        put_opt(&mut basic, "email", account.email.as_deref());
        put_opt(&mut basic, "lang", account.lang.as_deref());

        let mut profile = AttributeMap::new();
        profile.insert("realm".to_string(), serde_json::json!(account.realm));
        profile.insert(
            "repository_id".to_string(),
            serde_json::json!(account.repository_id),
        );
        profile.insert(
            "account_id".to_string(),
            serde_json::json!(account.account_id),
        );
        profile.insert(
            "status".to_string(),
            serde_json::json!(account.status.to_string()),
        );
        profile.insert("confirmed".to_string(), serde_json::json!(account.confirmed));

        let mut email = AttributeMap::new();
        put_opt(&mut email, "email", account.email.as_deref());
        email.insert(
            "email_verified".to_string(),
            serde_json::json!(account.email_verified),
        );

        let mut openid = AttributeMap::new();
        openid.insert("sub".to_string(), serde_json::json!(scope.subject_id));
        openid.insert(
            "preferred_username".to_string(),
            serde_json::json!(account.account_id),
        );
        put_opt(&mut openid, "given_name", account.name.as_deref());
        put_opt(&mut openid, "family_name", account.surname.as_deref());
        put_opt(&mut openid, "email", account.email.as_deref());
        openid.insert(
            "email_verified".to_string(),
            serde_json::json!(account.email_verified),
        );
        put_opt(&mut openid, "locale", account.lang.as_deref());

        vec![
            AttributeSet::new(scope.clone(), SET_BASIC_PROFILE, basic),
            AttributeSet::new(scope.clone(), SET_ACCOUNT_PROFILE, profile),
            AttributeSet::new(scope.clone(), SET_EMAIL, email),
            AttributeSet::new(scope, SET_OPENID, openid),
        ]
    }

    /// Replaces the named set for a subject wholesale.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the set id is not declared for this
    /// provider, or an error if the storage operation fails.
    pub async fn put(
        &self,
        subject_id: &str,
        set_id: &str,
        attributes: AttributeMap,
    ) -> BrokerResult<AttributeSet> {
        let mapper = self.mappers.get(set_id).ok_or_else(|| {
            BrokerError::invalid_input(format!("unknown attribute set: {set_id}"))
        })?;

        let scope = AttributeScope::for_subject(&self.config, subject_id);
        let set = AttributeSet::new(scope, set_id, mapper.map(&attributes));
        self.store.put_set(&set).await?;
        Ok(set)
    }

    /// Finds the persisted named set for a subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn find(&self, subject_id: &str, set_id: &str) -> BrokerResult<Option<AttributeSet>> {
        let scope = AttributeScope::for_subject(&self.config, subject_id);
        self.store.find_set(&scope, set_id).await
    }

    /// Lists all persisted sets for a subject under this provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn list(&self, subject_id: &str) -> BrokerResult<Vec<AttributeSet>> {
        let scope = AttributeScope::for_subject(&self.config, subject_id);
        self.store.list_by_subject(&scope).await
    }

    /// Deletes one named set, or every set for the subject when `set_id` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn delete(&self, subject_id: &str, set_id: Option<&str>) -> BrokerResult<()> {
        let scope = AttributeScope::for_subject(&self.config, subject_id);
        match set_id {
            Some(set_id) => self.store.delete_set(&scope, set_id).await,
            None => self.store.delete_by_subject(&scope).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AccountStatus;

    fn test_account() -> Account {
        Account::new("acme", "alice", "acme")
            .with_subject_id("s-1")
            .with_email("a@x.com")
            .with_name("Alice")
            .with_surname("Smith")
            .with_lang("en")
    }

    fn pipeline_config() -> Arc<ProviderConfig> {
        ProviderConfig::internal("acme").snapshot()
    }

    #[test]
    fn test_mapper_drops_unknown_keys_and_nulls() {
        let mapper = AttributeMapper::new("custom", &["a", "b"]);
        let mut raw = AttributeMap::new();
        raw.insert("a".to_string(), serde_json::json!("keep"));
        raw.insert("b".to_string(), serde_json::Value::Null);
        raw.insert("c".to_string(), serde_json::json!("drop"));

        let mapped = mapper.map(&raw);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped.get("a"), Some(&serde_json::json!("keep")));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let store = Arc::new(crate::storage::tests::NullAttributeStore);
        let pipeline = AttributePipeline::new(store, pipeline_config());
        let account = test_account();

        let first = pipeline.extract(&account);
        let second = pipeline.extract(&account);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_extract_builds_typed_sets() {
        let store = Arc::new(crate::storage::tests::NullAttributeStore);
        let pipeline = AttributePipeline::new(store, pipeline_config());
        let account = test_account();

        let sets = pipeline.extract(&account);
        let by_id = |id: &str| sets.iter().find(|s| s.set_id == id).unwrap();

        let basic = by_id(SET_BASIC_PROFILE);
        assert_eq!(basic.get("username"), Some(&serde_json::json!("alice")));
        assert_eq!(basic.get("name"), Some(&serde_json::json!("Alice")));

        let profile = by_id(SET_ACCOUNT_PROFILE);
        assert_eq!(profile.get("realm"), Some(&serde_json::json!("acme")));
        assert_eq!(profile.get("status"), Some(&serde_json::json!("active")));

        let email = by_id(SET_EMAIL);
        assert_eq!(email.get("email"), Some(&serde_json::json!("a@x.com")));
        assert_eq!(email.get("email_verified"), Some(&serde_json::json!(false)));

        let openid = by_id(SET_OPENID);
        assert_eq!(openid.get("sub"), Some(&serde_json::json!("s-1")));
        assert_eq!(
            openid.get("preferred_username"),
            Some(&serde_json::json!("alice"))
        );
        assert_eq!(openid.get("locale"), Some(&serde_json::json!("en")));
        assert_eq!(openid.scope.subject_id, "s-1");
    }

    #[test]
    fn test_extract_inactive_status_surfaces() {
        let store = Arc::new(crate::storage::tests::NullAttributeStore);
        let pipeline = AttributePipeline::new(store, pipeline_config());
        let account = test_account().with_status(AccountStatus::Inactive);

        let sets = pipeline.extract(&account);
        let profile = sets
            .iter()
            .find(|s| s.set_id == SET_ACCOUNT_PROFILE)
            .unwrap();
        assert_eq!(profile.get("status"), Some(&serde_json::json!("inactive")));
    }
}
