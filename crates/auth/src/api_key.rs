//! The `ApiKey` model (spec.md §3, §4.2): what `KeyRegistry` looks up and
//! what `AuthGate` checks a request against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use errly_core::{ApiKeyId, ProjectId, Scope};

/// A provisioned API key, as resolved by its SHA-256 hash.
///
/// Never carries the raw token — only `key_hash` (what it was looked up
/// by) and `key_prefix` (safe to display). Scopes are closed-world: a
/// request needs an exact scope match, not a hierarchy walk (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub key_hash: String,
    pub key_prefix: String,
    pub project_id: ProjectId,
    pub scopes: Vec<Scope>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Whether this key is authorized for `scope` (spec.md §4.4 scope check).
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    /// Whether this key's lifetime has run out as of `now` (spec.md §4.4
    /// expiry check). A key with no `expires_at` never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(scopes: Vec<Scope>, expires_at: Option<DateTime<Utc>>) -> ApiKey {
        ApiKey {
            id: ApiKeyId::new(),
            key_hash: "hash".to_string(),
            key_prefix: "errly_ab12_a".to_string(),
            project_id: ProjectId::new(),
            scopes,
            expires_at,
            last_used_at: None,
        }
    }

    #[test]
    fn has_scope_is_exact_match() {
        let k = key(vec![Scope::Ingest], None);
        assert!(k.has_scope(Scope::Ingest));
        assert!(!k.has_scope(Scope::Admin));
    }

    #[test]
    fn no_expiry_never_expires() {
        let k = key(vec![Scope::Ingest], None);
        assert!(!k.is_expired(Utc::now()));
    }

    #[test]
    fn expires_at_boundary_counts_as_expired() {
        let now = Utc::now();
        let k = key(vec![Scope::Ingest], Some(now));
        assert!(k.is_expired(now));
    }

    #[test]
    fn future_expiry_is_not_yet_expired() {
        let now = Utc::now();
        let later = now + chrono::Duration::hours(1);
        let k = key(vec![Scope::Ingest], Some(later));
        assert!(!k.is_expired(now));
    }
}
