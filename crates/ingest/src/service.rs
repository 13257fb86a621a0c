//! Steps 2-5 of spec.md §4.7: group the normalized batch by fingerprint,
//! persist it, and upsert one issue per fingerprint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use errly_core::{ErrlyError, ErrlyResult, IssueId, ProjectId};
use errly_events::{EventGroup, ErrorEvent, Issue, RawEvent};
use errly_infra::{EventStore, IssueStore};

use crate::normalize::normalize;

/// What the handler needs to report back to the client (spec.md §4.8: the
/// ingest response body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub accepted: usize,
    pub issue_ids: Vec<IssueId>,
}

pub struct IngestService<E, I> {
    event_store: E,
    issue_store: I,
    event_store_timeout: Duration,
    issue_store_timeout: Duration,
}

impl<E, I> IngestService<E, I>
where
    E: EventStore,
    I: IssueStore,
{
    pub fn new(event_store: E, issue_store: I, event_store_timeout: Duration, issue_store_timeout: Duration) -> Self {
        Self {
            event_store,
            issue_store,
            event_store_timeout,
            issue_store_timeout,
        }
    }

    /// Run the full pipeline on one already-validated batch (spec.md §4.7).
    ///
    /// Steps: normalize every raw event, group the normalized events by
    /// fingerprint, persist the whole batch in one write, then for each
    /// fingerprint group look up the existing issue and either create or
    /// monotonically merge it. Every store call is bounded (spec.md §5) so a
    /// hung ClickHouse/Postgres round-trip fails the request instead of
    /// hanging it indefinitely.
    pub async fn ingest(&self, project_id: ProjectId, raw_events: Vec<RawEvent>) -> ErrlyResult<IngestSummary> {
        let received_at = Utc::now();

        let normalized: Vec<ErrorEvent> = raw_events
            .into_iter()
            .map(|raw| normalize(project_id, raw, received_at))
            .collect();

        tokio::time::timeout(self.event_store_timeout, self.event_store.insert_batch(&normalized))
            .await
            .map_err(|_| ErrlyError::internal("event store insert timed out"))??;

        let mut groups: HashMap<String, Vec<ErrorEvent>> = HashMap::new();
        for event in normalized.iter() {
            groups
                .entry(event.fingerprint.clone())
                .or_default()
                .push(event.clone());
        }

        let mut issue_ids = Vec::with_capacity(groups.len());
        for (fingerprint, events) in groups {
            let group = EventGroup::new(&events);

            let existing = tokio::time::timeout(self.issue_store_timeout, self.issue_store.lookup(project_id, &fingerprint))
                .await
                .map_err(|_| ErrlyError::internal("issue store lookup timed out"))??;
            let issue = match existing {
                Some(issue) => issue.merge_group(&group, received_at),
                None => Issue::from_group(IssueId::new(), &group, received_at),
            };

            issue_ids.push(issue.id);
            tokio::time::timeout(self.issue_store_timeout, self.issue_store.upsert(&issue))
                .await
                .map_err(|_| ErrlyError::internal("issue store upsert timed out"))??;
        }

        Ok(IngestSummary {
            accepted: normalized.len(),
            issue_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errly_infra::events_store::InMemoryEventStore;
    use errly_infra::issue_store::InMemoryIssueStore;
    use std::collections::HashMap as Map;

    fn raw(message: &str, env: &str) -> RawEvent {
        RawEvent {
            message: message.to_string(),
            environment: env.to_string(),
            level: None,
            timestamp: None,
            stack_trace: None,
            release_version: None,
            user_id: None,
            user_email: None,
            user_ip: None,
            browser: None,
            os: None,
            url: None,
            tags: Map::new(),
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn one_issue_per_distinct_fingerprint() {
        let service = IngestService::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryIssueStore::new()),
            Duration::from_secs(30),
            Duration::from_secs(30),
        );
        let project_id = ProjectId::new();

        let summary = service
            .ingest(
                project_id,
                vec![raw("boom", "prod"), raw("boom", "prod"), raw("bang", "prod")],
            )
            .await
            .unwrap();

        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.issue_ids.len(), 2);
    }

    #[tokio::test]
    async fn replaying_a_batch_merges_into_the_same_issue() {
        let service = IngestService::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryIssueStore::new()),
            Duration::from_secs(30),
            Duration::from_secs(30),
        );
        let project_id = ProjectId::new();

        let first = service
            .ingest(project_id, vec![raw("boom", "prod")])
            .await
            .unwrap();
        let second = service
            .ingest(project_id, vec![raw("boom", "prod")])
            .await
            .unwrap();

        assert_eq!(first.issue_ids, second.issue_ids);
    }
}
