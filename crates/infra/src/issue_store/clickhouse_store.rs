//! ClickHouse-backed `IssueStore`.
//!
//! `issues` is a `ReplacingMergeTree` keyed by `(project_id, id)` and
//! versioned on `updated_at` (spec.md §6): every upsert is a plain insert
//! of a new row, and ClickHouse's background merge eventually collapses
//! rows to the newest version per key. `lookup` never relies on that
//! merge running, or on `FINAL` (spec.md §9 Open Question 3) — it instead
//! picks the most recently updated row per `(project_id, fingerprint)`
//! itself (`ORDER BY updated_at DESC LIMIT 1`), so a reader can still
//! observe a slightly stale row relative to an in-flight concurrent write,
//! which the monotonic merge semantics in `errly_events::Issue` already
//! tolerate (replaying a merge on a stale base still only grows counters
//! and widens the seen range, it never retreats).

use clickhouse::{Client, Row as ClickHouseRow};
use serde::{Deserialize, Serialize};

use errly_core::{ErrlyError, ErrlyResult, IssueId, IssueStatus, Level, ProjectId};
use errly_events::Issue;

const ISSUES_TABLE: &str = "issues";

#[derive(Debug, Clone, Serialize, Deserialize, ClickHouseRow)]
struct IssueRow {
    id: String,
    project_id: String,
    fingerprint: String,
    message: String,
    level: String,
    status: String,
    first_seen: i64,
    last_seen: i64,
    event_count: u64,
    user_count: u64,
    environments_json: String,
    tags_json: String,
    updated_at: i64,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        IssueRow {
            id: issue.id.to_string(),
            project_id: issue.project_id.to_string(),
            fingerprint: issue.fingerprint.clone(),
            message: issue.message.clone(),
            level: issue.level.as_str().to_string(),
            status: issue.status.as_str().to_string(),
            first_seen: issue.first_seen.timestamp_millis(),
            last_seen: issue.last_seen.timestamp_millis(),
            event_count: issue.event_count,
            user_count: issue.user_count,
            environments_json: serde_json::to_string(&issue.environments).unwrap_or_default(),
            tags_json: serde_json::to_string(&issue.tags).unwrap_or_default(),
            updated_at: issue.updated_at.timestamp_millis(),
        }
    }
}

impl TryFrom<IssueRow> for Issue {
    type Error = ErrlyError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        use chrono::{DateTime, Utc};

        let status = match row.status.as_str() {
            "unresolved" => IssueStatus::Unresolved,
            "resolved" => IssueStatus::Resolved,
            "ignored" => IssueStatus::Ignored,
            other => {
                return Err(ErrlyError::internal(format!(
                    "invalid stored issue status '{other}'"
                )))
            }
        };

        Ok(Issue {
            id: row.id.parse::<IssueId>()?,
            project_id: row.project_id.parse::<ProjectId>()?,
            fingerprint: row.fingerprint,
            message: row.message,
            level: row.level.parse::<Level>()?,
            status,
            first_seen: DateTime::<Utc>::from_timestamp_millis(row.first_seen)
                .ok_or_else(|| ErrlyError::internal("invalid stored first_seen"))?,
            last_seen: DateTime::<Utc>::from_timestamp_millis(row.last_seen)
                .ok_or_else(|| ErrlyError::internal("invalid stored last_seen"))?,
            event_count: row.event_count,
            user_count: row.user_count,
            environments: serde_json::from_str(&row.environments_json).unwrap_or_default(),
            tags: serde_json::from_str(&row.tags_json).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp_millis(row.updated_at)
                .ok_or_else(|| ErrlyError::internal("invalid stored updated_at"))?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClickHouseIssueStore {
    client: Client,
}

impl ClickHouseIssueStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl super::IssueStore for ClickHouseIssueStore {
    async fn lookup(
        &self,
        project_id: ProjectId,
        fingerprint: &str,
    ) -> ErrlyResult<Option<Issue>> {
        let row = self
            .client
            .query(
                "SELECT id, project_id, fingerprint, message, level, status, \
                 first_seen, last_seen, event_count, user_count, \
                 environments_json, tags_json, updated_at \
                 FROM issues \
                 WHERE project_id = ? AND fingerprint = ? \
                 ORDER BY updated_at DESC \
                 LIMIT 1",
            )
            .bind(project_id.to_string())
            .bind(fingerprint)
            .fetch_optional::<IssueRow>()
            .await
            .map_err(|e| ErrlyError::unavailable(format!("issue lookup failed: {e}")))?;

        row.map(Issue::try_from).transpose()
    }

    async fn upsert(&self, issue: &Issue) -> ErrlyResult<()> {
        let mut insert = self
            .client
            .insert(ISSUES_TABLE)
            .map_err(|e| ErrlyError::unavailable(format!("issue insert failed: {e}")))?;

        insert
            .write(&IssueRow::from(issue))
            .await
            .map_err(|e| ErrlyError::unavailable(format!("issue write failed: {e}")))?;

        insert
            .end()
            .await
            .map_err(|e| ErrlyError::unavailable(format!("issue commit failed: {e}")))
    }

    async fn set_status(&self, issue_id: IssueId, status: IssueStatus) -> ErrlyResult<()> {
        let row = self
            .client
            .query(
                "SELECT id, project_id, fingerprint, message, level, status, \
                 first_seen, last_seen, event_count, user_count, \
                 environments_json, tags_json, updated_at \
                 FROM issues WHERE id = ? ORDER BY updated_at DESC LIMIT 1",
            )
            .bind(issue_id.to_string())
            .fetch_optional::<IssueRow>()
            .await
            .map_err(|e| ErrlyError::unavailable(format!("issue status lookup failed: {e}")))?
            .ok_or_else(|| ErrlyError::internal(format!("unknown issue id {issue_id}")))?;

        let mut issue = Issue::try_from(row)?;
        issue.status = status;
        issue.updated_at = chrono::Utc::now();

        self.upsert(&issue).await
    }
}
