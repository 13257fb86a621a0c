//! Issue status (mutated by the admin query path, never by the ingest core).

use serde::{Deserialize, Serialize};

/// Lifecycle status of an issue (spec.md §3).
///
/// The ingestion core only ever produces `Unresolved` on insert; this type
/// exists here so `IssueStore::set_status` has a concrete type to accept,
/// even though nothing in this workspace calls it — it documents the
/// external contract the admin/query surface relies on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Unresolved,
    Resolved,
    Ignored,
}

impl Default for IssueStatus {
    fn default() -> Self {
        IssueStatus::Unresolved
    }
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Unresolved => "unresolved",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Ignored => "ignored",
        }
    }
}
