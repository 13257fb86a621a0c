//! `EventStore`: the append-only, high-volume store of normalized error
//! events (spec.md §3, §6 — ClickHouse is the natural fit: columnar,
//! append-heavy, queried by time range and project).

mod clickhouse_store;
mod in_memory;

use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use errly_core::{ErrlyResult, ProjectId};
use errly_events::ErrorEvent;

pub use clickhouse_store::ClickHouseEventStore;
pub use in_memory::InMemoryEventStore;

/// One bucket of a time-series query (spec.md §4.6 dashboard queries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesPoint {
    pub bucket_start: DateTime<Utc>,
    pub count: u64,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a normalized, already-fingerprinted batch (spec.md §4.7 step 3).
    /// Batch insert, not one-row-at-a-time, so ingest throughput does not
    /// pay per-row round trips (spec.md §4.6 scale target).
    async fn insert_batch(&self, events: &[ErrorEvent]) -> ErrlyResult<()>;

    /// Raw events for a project within a time range, newest first, capped
    /// at `limit` rows (spec.md §4.6).
    async fn query_events(
        &self,
        project_id: ProjectId,
        range: Range<DateTime<Utc>>,
        limit: usize,
    ) -> ErrlyResult<Vec<ErrorEvent>>;

    /// Hourly event-count buckets for a project over a time range
    /// (spec.md §4.6 dashboard time series).
    async fn time_series(
        &self,
        project_id: ProjectId,
        range: Range<DateTime<Utc>>,
    ) -> ErrlyResult<Vec<TimeSeriesPoint>>;
}

#[async_trait]
impl<T> EventStore for Arc<T>
where
    T: EventStore + ?Sized,
{
    async fn insert_batch(&self, events: &[ErrorEvent]) -> ErrlyResult<()> {
        (**self).insert_batch(events).await
    }

    async fn query_events(
        &self,
        project_id: ProjectId,
        range: Range<DateTime<Utc>>,
        limit: usize,
    ) -> ErrlyResult<Vec<ErrorEvent>> {
        (**self).query_events(project_id, range, limit).await
    }

    async fn time_series(
        &self,
        project_id: ProjectId,
        range: Range<DateTime<Utc>>,
    ) -> ErrlyResult<Vec<TimeSeriesPoint>> {
        (**self).time_series(project_id, range).await
    }
}
