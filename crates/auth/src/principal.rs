//! The authenticated identity a request carries once `AuthGate` succeeds.

use errly_core::{ProjectId, Scope};

use crate::api_key::ApiKey;

/// What `AuthGate` attaches to a request's extensions after a successful
/// lookup (errly-api's middleware does the attaching; this crate only
/// defines the shape so handlers don't need to depend on the registry
/// trait to read it).
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub api_key: ApiKey,
}

impl Principal {
    pub fn new(api_key: ApiKey) -> Self {
        Self { api_key }
    }

    pub fn project_id(&self) -> ProjectId {
        self.api_key.project_id
    }

    pub fn has_scope(&self, scope: Scope) -> bool {
        self.api_key.has_scope(scope)
    }
}
