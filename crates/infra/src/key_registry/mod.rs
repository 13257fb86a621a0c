//! `KeyRegistry`: the lookup of a hashed API key to its record (spec.md §4.2,
//! §4.4, §9 Re-architecture guidance — a narrow capability interface rather
//! than a god-trait).

mod in_memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use errly_auth::ApiKey;
use errly_core::{ErrlyResult, ProjectId};

pub use in_memory::InMemoryKeyRegistry;
pub use postgres::PostgresKeyRegistry;

/// Resolves a hashed API key to its record and records last-use times.
///
/// Implementations must treat `get_by_hash` as the hot path of every
/// authenticated request (spec.md §4.4) — it is called once per request,
/// under the 5s auth-provider budget (spec.md §5).
#[async_trait]
pub trait KeyRegistry: Send + Sync {
    async fn get_by_hash(&self, key_hash: &str) -> ErrlyResult<Option<ApiKey>>;

    /// Best-effort write of the key's last-used timestamp. Never on the
    /// request's critical path (spec.md §4.4: "does not block the request");
    /// callers spawn this with its own deadline.
    async fn touch_last_used(&self, key_hash: &str, at: DateTime<Utc>) -> ErrlyResult<()>;

    /// AuthGate step 6 (spec.md §4.6): does `project_id` still exist? A key
    /// can outlive the project it was issued under (the project was
    /// deleted but its keys weren't revoked yet) — callers map `false` to
    /// `401 PROJECT_NOT_FOUND`.
    async fn project_exists(&self, project_id: ProjectId) -> ErrlyResult<bool>;
}

#[async_trait]
impl<T> KeyRegistry for Arc<T>
where
    T: KeyRegistry + ?Sized,
{
    async fn get_by_hash(&self, key_hash: &str) -> ErrlyResult<Option<ApiKey>> {
        (**self).get_by_hash(key_hash).await
    }

    async fn touch_last_used(&self, key_hash: &str, at: DateTime<Utc>) -> ErrlyResult<()> {
        (**self).touch_last_used(key_hash, at).await
    }

    async fn project_exists(&self, project_id: ProjectId) -> ErrlyResult<bool> {
        (**self).project_exists(project_id).await
    }
}
