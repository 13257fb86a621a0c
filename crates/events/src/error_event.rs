//! The persisted, normalized error event (spec.md §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use errly_core::{EventId, Level, ProjectId};

/// A single, immutable occurrence of an error, as stored by `EventStore`.
///
/// Built by `IngestService::normalize` (errly-ingest) from a `RawEvent`;
/// never mutated after insertion (spec.md §3: "Immutable after insertion").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub id: EventId,
    pub project_id: ProjectId,
    /// Client-provided or server-assigned occurrence time, in milliseconds.
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub stack_trace: Option<String>,
    pub environment: String,
    pub release_version: Option<String>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_ip: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub url: Option<String>,
    pub tags: HashMap<String, String>,
    pub extra: HashMap<String, JsonValue>,
    pub fingerprint: String,
    pub level: Level,
    /// Server ingest time, in milliseconds.
    pub created_at: DateTime<Utc>,
}
