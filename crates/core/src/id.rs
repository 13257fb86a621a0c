//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrlyError;

/// Identifier of a project (the unit of API-key scoping and data tenancy).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

/// Identifier of an API key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(Uuid);

/// Identifier of an issue (the aggregate of events sharing a fingerprint).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(Uuid);

/// Identifier of a single error event.
///
/// Always a v4 UUID (spec.md §3/§4.2: collisions are assumed astronomically
/// unlikely; this underpins at-least-once deduplication in EventStore).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = ErrlyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| ErrlyError::client_format(format!("invalid {}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(ProjectId, "project id");
impl_uuid_newtype!(ApiKeyId, "api key id");
impl_uuid_newtype!(IssueId, "issue id");
impl_uuid_newtype!(EventId, "event id");

impl ProjectId {
    /// Generate a fresh identifier. Uses UUIDv7 (time-ordered): projects are
    /// server-assigned, long-lived rows where insertion-order locality helps
    /// the backing indexes.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl ApiKeyId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl IssueId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl EventId {
    /// Generate a fresh identifier. Always v4 — see the type's doc comment.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for ApiKeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}
