//! Postgres-backed `KeyRegistry` (spec.md §6: relational store of record for
//! projects and API keys — low write volume, strong consistency wanted).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use errly_auth::ApiKey;
use errly_core::{ApiKeyId, ErrlyError, ErrlyResult, ProjectId, Scope};

/// Postgres-backed API key lookup.
///
/// ## Thread Safety
///
/// Wraps a `sqlx::PgPool`, which is itself a cheaply cloneable connection
/// pool; `Arc` here just avoids a second layer of reference counting when
/// this type is itself stored behind an `Arc` (as `AuthGate`'s state does).
#[derive(Debug, Clone)]
pub struct PostgresKeyRegistry {
    pool: Arc<PgPool>,
}

impl PostgresKeyRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[derive(FromRow)]
struct ApiKeyRow {
    id: uuid::Uuid,
    key_hash: String,
    key_prefix: String,
    project_id: uuid::Uuid,
    scopes: Vec<String>,
    expires_at: Option<DateTime<Utc>>,
    last_used_at: Option<DateTime<Utc>>,
}

impl TryFrom<ApiKeyRow> for ApiKey {
    type Error = ErrlyError;

    fn try_from(row: ApiKeyRow) -> Result<Self, Self::Error> {
        let scopes = row
            .scopes
            .iter()
            .map(|s| s.parse::<Scope>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApiKey {
            id: ApiKeyId::from_uuid(row.id),
            key_hash: row.key_hash,
            key_prefix: row.key_prefix,
            project_id: ProjectId::from_uuid(row.project_id),
            scopes,
            expires_at: row.expires_at,
            last_used_at: row.last_used_at,
        })
    }
}

#[async_trait]
impl super::KeyRegistry for PostgresKeyRegistry {
    #[instrument(skip(self), err)]
    async fn get_by_hash(&self, key_hash: &str) -> ErrlyResult<Option<ApiKey>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT id, key_hash, key_prefix, project_id, scopes, expires_at, last_used_at
            FROM api_keys
            WHERE key_hash = $1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| ErrlyError::unavailable(format!("key registry lookup failed: {e}")))?;

        row.map(ApiKey::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn touch_last_used(&self, key_hash: &str, at: DateTime<Utc>) -> ErrlyResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = $2 WHERE key_hash = $1")
            .bind(key_hash)
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(|e| ErrlyError::unavailable(format!("key registry touch failed: {e}")))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn project_exists(&self, project_id: ProjectId) -> ErrlyResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(project_id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| ErrlyError::unavailable(format!("project lookup failed: {e}")))?;

        Ok(exists)
    }
}
