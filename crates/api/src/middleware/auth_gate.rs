//! `AuthGate`: the auth middleware every protected route runs behind
//! (spec.md §4.4).
//!
//! Mirrors the teacher's `auth_middleware`/`extract_bearer` shape: pull the
//! bearer token, validate it, attach the resolved identity to the
//! request's extensions, and let the handler run. The differences from
//! that shape are spec-driven: a format check before any IO, a bounded
//! lookup instead of a local JWT decode, and a detached "touch" write
//! that never blocks the response.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use errly_auth::{hash_token, validate_format, ApiKey, Principal};
use errly_core::{ErrlyError, Scope};
use errly_infra::KeyRegistry;

use crate::errors::error_response;

#[derive(Clone)]
pub struct AuthGateState {
    pub key_registry: Arc<dyn KeyRegistry>,
    pub lookup_timeout: Duration,
    /// Scope every request behind this gate instance must carry, checked
    /// before the project-exists lookup (spec.md §4.6 steps 5-6). `None`
    /// means any authenticated key is sufficient.
    pub required_scope: Option<Scope>,
}

pub async fn auth_gate(
    State(state): State<AuthGateState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(api_key) => {
            spawn_touch_last_used(state.key_registry.clone(), api_key.key_hash.clone());
            req.extensions_mut().insert(Principal::new(api_key));
            next.run(req).await
        }
        Err(error) => {
            errly_observability::metrics::record_auth_failure(error.code());
            error_response(error)
        }
    }
}

async fn authenticate(state: &AuthGateState, headers: &HeaderMap) -> Result<ApiKey, ErrlyError> {
    let raw_token = extract_bearer(headers)?;

    validate_format(raw_token)
        .map_err(|e| ErrlyError::auth("INVALID_API_KEY_FORMAT", e.to_string()))?;

    let key_hash = hash_token(raw_token);

    let api_key = tokio::time::timeout(
        state.lookup_timeout,
        state.key_registry.get_by_hash(&key_hash),
    )
    .await
    .map_err(|_| ErrlyError::internal("key registry lookup timed out"))??
    .ok_or_else(|| ErrlyError::auth("INVALID_API_KEY", "api key not recognized"))?;

    if api_key.is_expired(Utc::now()) {
        return Err(ErrlyError::auth("API_KEY_EXPIRED", "api key has expired"));
    }

    if let Some(scope) = state.required_scope {
        if !api_key.has_scope(scope) {
            return Err(ErrlyError::auth(
                "INSUFFICIENT_SCOPE",
                format!("api key is missing required scope '{scope}'"),
            ));
        }
    }

    let project_exists = tokio::time::timeout(
        state.lookup_timeout,
        state.key_registry.project_exists(api_key.project_id),
    )
    .await
    .map_err(|_| ErrlyError::internal("project lookup timed out"))??;

    if !project_exists {
        return Err(ErrlyError::auth("PROJECT_NOT_FOUND", "project no longer exists"));
    }

    Ok(api_key)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ErrlyError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ErrlyError::auth("MISSING_AUTH_HEADER", "missing authorization header"))?;

    let header = header
        .to_str()
        .map_err(|_| ErrlyError::auth("INVALID_AUTH_FORMAT", "authorization header is not valid utf-8"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ErrlyError::auth("INVALID_AUTH_FORMAT", "expected a Bearer token"))?
        .trim();

    if token.is_empty() {
        return Err(ErrlyError::auth("INVALID_AUTH_FORMAT", "bearer token is empty"));
    }

    Ok(token)
}

/// Record that a key was used without holding up the response for it
/// (spec.md §4.4: "does not block the request"). Given its own deadline so
/// a slow registry can't leak tasks indefinitely.
fn spawn_touch_last_used(key_registry: Arc<dyn KeyRegistry>, key_hash: String) {
    tokio::spawn(async move {
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            key_registry.touch_last_used(&key_hash, Utc::now()),
        )
        .await;

        if let Err(elapsed) = result {
            tracing::warn!(%elapsed, "touch_last_used timed out");
        } else if let Ok(Err(error)) = result {
            tracing::warn!(%error, "touch_last_used failed");
        }
    });
}

/// Require that the authenticated principal carries `scope`, or fail with
/// `403` (spec.md §4.4 scope check). Checked inside handlers/route groups
/// rather than the gate itself, since different routes require different
/// scopes.
pub fn ensure_scope(principal: &Principal, scope: errly_core::Scope) -> Result<(), Response> {
    if principal.has_scope(scope) {
        Ok(())
    } else {
        Err(error_response(ErrlyError::auth(
            "INSUFFICIENT_SCOPE",
            format!("api key is missing required scope '{scope}'"),
        )))
    }
}
