//! `IssueStore`: lookup-by-fingerprint and upsert of the `Issue` aggregate
//! (spec.md §3, §4.3, §4.7).

mod clickhouse_store;
mod in_memory;

use std::sync::Arc;

use async_trait::async_trait;

use errly_core::{ErrlyResult, IssueStatus, ProjectId};
use errly_events::Issue;

pub use clickhouse_store::ClickHouseIssueStore;
pub use in_memory::InMemoryIssueStore;

#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Find the current issue for a fingerprint within a project, if any
    /// (spec.md §4.7 step 4, the lookup half of the upsert).
    async fn lookup(
        &self,
        project_id: ProjectId,
        fingerprint: &str,
    ) -> ErrlyResult<Option<Issue>>;

    /// Write an issue (either a freshly built one or a merged one) back to
    /// the store. `IngestService` decides which via `Issue::from_group` /
    /// `Issue::merge_group` (errly-events) before calling this.
    async fn upsert(&self, issue: &Issue) -> ErrlyResult<()>;

    /// Mutate status on the admin/query path. Never called by the ingest
    /// pipeline (spec.md §3: status is an external contract, see
    /// `errly_core::IssueStatus`).
    async fn set_status(&self, issue_id: errly_core::IssueId, status: IssueStatus) -> ErrlyResult<()>;
}

#[async_trait]
impl<T> IssueStore for Arc<T>
where
    T: IssueStore + ?Sized,
{
    async fn lookup(
        &self,
        project_id: ProjectId,
        fingerprint: &str,
    ) -> ErrlyResult<Option<Issue>> {
        (**self).lookup(project_id, fingerprint).await
    }

    async fn upsert(&self, issue: &Issue) -> ErrlyResult<()> {
        (**self).upsert(issue).await
    }

    async fn set_status(&self, issue_id: errly_core::IssueId, status: IssueStatus) -> ErrlyResult<()> {
        (**self).set_status(issue_id, status).await
    }
}
