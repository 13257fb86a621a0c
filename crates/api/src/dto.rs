//! Request/response DTOs for the HTTP surface (spec.md §6).

use serde::Serialize;

use errly_core::IssueId;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub accepted: usize,
    pub issue_ids: Vec<IssueId>,
}

#[derive(Debug, Serialize)]
pub struct IngestInfoResponse {
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub accepted_timestamp_formats: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct AuthValidateResponse {
    pub valid: bool,
    pub project_id: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub key_registry: bool,
    pub event_store: bool,
    pub issue_store: bool,
}
