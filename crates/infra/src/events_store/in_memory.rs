//! In-memory `EventStore`, for ingest-pipeline tests.

use std::ops::Range;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};

use errly_core::{ErrlyResult, ProjectId};
use errly_events::ErrorEvent;

use super::TimeSeriesPoint;

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<ErrorEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl super::EventStore for InMemoryEventStore {
    async fn insert_batch(&self, events: &[ErrorEvent]) -> ErrlyResult<()> {
        self.events.lock().unwrap().extend_from_slice(events);
        Ok(())
    }

    async fn query_events(
        &self,
        project_id: ProjectId,
        range: Range<DateTime<Utc>>,
        limit: usize,
    ) -> ErrlyResult<Vec<ErrorEvent>> {
        let mut matching: Vec<ErrorEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.project_id == project_id && range.contains(&e.timestamp))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn time_series(
        &self,
        project_id: ProjectId,
        range: Range<DateTime<Utc>>,
    ) -> ErrlyResult<Vec<TimeSeriesPoint>> {
        let events = self.events.lock().unwrap();
        let mut buckets: std::collections::BTreeMap<DateTime<Utc>, u64> =
            std::collections::BTreeMap::new();

        for event in events
            .iter()
            .filter(|e| e.project_id == project_id && range.contains(&e.timestamp))
        {
            let bucket_start = event
                .timestamp
                .duration_trunc(Duration::hours(1))
                .unwrap_or(event.timestamp);
            *buckets.entry(bucket_start).or_insert(0) += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(bucket_start, count)| TimeSeriesPoint {
                bucket_start,
                count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events_store::EventStore;
    use errly_core::{EventId, Level};
    use std::collections::HashMap;

    fn event(project_id: ProjectId, ts: DateTime<Utc>) -> ErrorEvent {
        ErrorEvent {
            id: EventId::new(),
            project_id,
            timestamp: ts,
            message: "boom".to_string(),
            stack_trace: None,
            environment: "prod".to_string(),
            release_version: None,
            user_id: None,
            user_email: None,
            user_ip: None,
            browser: None,
            os: None,
            url: None,
            tags: HashMap::new(),
            extra: HashMap::new(),
            fingerprint: "fp".to_string(),
            level: Level::Error,
            created_at: ts,
        }
    }

    #[tokio::test]
    async fn query_filters_by_project_and_range() {
        let store = InMemoryEventStore::new();
        let p1 = ProjectId::new();
        let p2 = ProjectId::new();
        let now = Utc::now();

        store
            .insert_batch(&[event(p1, now), event(p2, now)])
            .await
            .unwrap();

        let results = store
            .query_events(p1, (now - Duration::minutes(1))..(now + Duration::minutes(1)), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].project_id, p1);
    }
}
