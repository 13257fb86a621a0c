//! In-memory `IssueStore`, for ingest-pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use errly_core::{ErrlyError, ErrlyResult, IssueId, IssueStatus, ProjectId};
use errly_events::Issue;

#[derive(Debug, Default)]
pub struct InMemoryIssueStore {
    issues: Mutex<HashMap<(ProjectId, String), Issue>>,
}

impl InMemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::IssueStore for InMemoryIssueStore {
    async fn lookup(
        &self,
        project_id: ProjectId,
        fingerprint: &str,
    ) -> ErrlyResult<Option<Issue>> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .get(&(project_id, fingerprint.to_string()))
            .cloned())
    }

    async fn upsert(&self, issue: &Issue) -> ErrlyResult<()> {
        self.issues.lock().unwrap().insert(
            (issue.project_id, issue.fingerprint.clone()),
            issue.clone(),
        );
        Ok(())
    }

    async fn set_status(&self, issue_id: IssueId, status: IssueStatus) -> ErrlyResult<()> {
        let mut issues = self.issues.lock().unwrap();
        let issue = issues
            .values_mut()
            .find(|i| i.id == issue_id)
            .ok_or_else(|| ErrlyError::internal(format!("unknown issue id {issue_id}")))?;
        issue.status = status;
        issue.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue_store::IssueStore;
    use errly_events::{EventGroup, ErrorEvent};
    use errly_core::{EventId, Level};

    fn event(project_id: ProjectId) -> ErrorEvent {
        ErrorEvent {
            id: EventId::new(),
            project_id,
            timestamp: chrono::Utc::now(),
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
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_then_lookup_round_trips() {
        let store = InMemoryIssueStore::new();
        let project_id = ProjectId::new();
        let events = vec![event(project_id)];
        let group = EventGroup::new(&events);
        let issue = Issue::from_group(IssueId::new(), &group, chrono::Utc::now());

        store.upsert(&issue).await.unwrap();
        let found = store.lookup(project_id, "fp").await.unwrap();
        assert_eq!(found.unwrap().id, issue.id);
    }

    #[tokio::test]
    async fn set_status_updates_in_place() {
        let store = InMemoryIssueStore::new();
        let project_id = ProjectId::new();
        let events = vec![event(project_id)];
        let group = EventGroup::new(&events);
        let issue = Issue::from_group(IssueId::new(), &group, chrono::Utc::now());
        store.upsert(&issue).await.unwrap();

        store.set_status(issue.id, IssueStatus::Resolved).await.unwrap();
        let found = store.lookup(project_id, "fp").await.unwrap().unwrap();
        assert_eq!(found.status, IssueStatus::Resolved);
    }
}
