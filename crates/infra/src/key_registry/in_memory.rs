//! In-memory `KeyRegistry`, for tests that exercise `AuthGate` without a
//! real Postgres instance.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use errly_auth::ApiKey;
use errly_core::{ErrlyResult, ProjectId};

#[derive(Debug, Default)]
pub struct InMemoryKeyRegistry {
    keys: Mutex<HashMap<String, ApiKey>>,
    /// Projects a key's `project_id` resolves against (AuthGate step 6).
    /// `insert` registers a key's project automatically, so the common
    /// case "the key's project exists" needs no extra setup; tests that
    /// want a `PROJECT_NOT_FOUND` miss call `remove_project` explicitly.
    projects: Mutex<HashSet<ProjectId>>,
}

impl InMemoryKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: ApiKey) {
        self.projects.lock().unwrap().insert(key.project_id);
        self.keys.lock().unwrap().insert(key.key_hash.clone(), key);
    }

    /// Simulate a project that was deleted but whose keys weren't revoked.
    pub fn remove_project(&self, project_id: ProjectId) {
        self.projects.lock().unwrap().remove(&project_id);
    }
}

#[async_trait]
impl super::KeyRegistry for InMemoryKeyRegistry {
    async fn get_by_hash(&self, key_hash: &str) -> ErrlyResult<Option<ApiKey>> {
        Ok(self.keys.lock().unwrap().get(key_hash).cloned())
    }

    async fn touch_last_used(&self, key_hash: &str, at: DateTime<Utc>) -> ErrlyResult<()> {
        if let Some(key) = self.keys.lock().unwrap().get_mut(key_hash) {
            key.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn project_exists(&self, project_id: ProjectId) -> ErrlyResult<bool> {
        Ok(self.projects.lock().unwrap().contains(&project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errly_core::{ApiKeyId, ProjectId, Scope};

    fn sample_key() -> ApiKey {
        ApiKey {
            id: ApiKeyId::new(),
            key_hash: "hash-1".to_string(),
            key_prefix: "errly_ab12_a".to_string(),
            project_id: ProjectId::new(),
            scopes: vec![Scope::Ingest],
            expires_at: None,
            last_used_at: None,
        }
    }

    #[tokio::test]
    async fn round_trips_by_hash() {
        let registry = InMemoryKeyRegistry::new();
        registry.insert(sample_key());

        let found = registry.get_by_hash("hash-1").await.unwrap();
        assert!(found.is_some());
        assert!(registry.get_by_hash("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn touch_updates_last_used() {
        let registry = InMemoryKeyRegistry::new();
        registry.insert(sample_key());

        let now = Utc::now();
        registry.touch_last_used("hash-1", now).await.unwrap();

        let found = registry.get_by_hash("hash-1").await.unwrap().unwrap();
        assert_eq!(found.last_used_at, Some(now));
    }

    #[tokio::test]
    async fn inserting_a_key_registers_its_project() {
        let registry = InMemoryKeyRegistry::new();
        let key = sample_key();
        let project_id = key.project_id;
        registry.insert(key);

        assert!(registry.project_exists(project_id).await.unwrap());
    }

    #[tokio::test]
    async fn removed_project_is_reported_missing() {
        let registry = InMemoryKeyRegistry::new();
        let key = sample_key();
        let project_id = key.project_id;
        registry.insert(key);
        registry.remove_project(project_id);

        assert!(!registry.project_exists(project_id).await.unwrap());
    }
}
