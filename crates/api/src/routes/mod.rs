pub mod auth;
pub mod health;
pub mod ingest;
pub mod metrics;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use errly_core::Scope;
use errly_infra::config::RateLimitPolicy;

use crate::middleware::{self, AuthGateState, RateLimitState};
use crate::state::AppState;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Layering, outermost first: `AuthGate` → the endpoint-class bucket
/// spec.md §4.5 assigns: ingestion routes get `ingest` then `burst`; every
/// other authenticated route gets `api_key`. The unauthenticated `/health`
/// route sits outside `AuthGate` entirely and gets its own `ip` bucket
/// (spec.md §4.5 scopes `ip` to the unauthenticated endpoint class only;
/// §6's interface table lists no bucket for `/health` or `/metrics`, so
/// neither carries one).
pub fn router(state: Arc<AppState>) -> Router {
    let ingest_routes = Router::new()
        .route("/api/v1/ingest", post(ingest::ingest))
        .route("/api/v1/ingest/info", get(ingest::ingest_info))
        .layer(axum::middleware::from_fn_with_state(
            bucket_state(&state, "burst", state.config.burst_policy, middleware::key_by_project),
            middleware::rate_limit,
        ))
        .layer(axum::middleware::from_fn_with_state(
            bucket_state(&state, "ingest", state.config.ingest_policy, middleware::key_by_project),
            middleware::rate_limit,
        ))
        .layer(axum::middleware::from_fn_with_state(
            auth_gate_state(&state, Some(Scope::Ingest)),
            middleware::auth_gate,
        ));

    let api_key_routes = Router::new()
        .route("/api/v1/auth/validate", post(auth::validate))
        .layer(axum::middleware::from_fn_with_state(
            bucket_state(&state, "api_key", state.config.api_key_policy, middleware::key_by_project),
            middleware::rate_limit,
        ))
        .layer(axum::middleware::from_fn_with_state(
            auth_gate_state(&state, None),
            middleware::auth_gate,
        ));

    let health_routes = Router::new().route("/health", get(health::health)).layer(
        axum::middleware::from_fn_with_state(
            bucket_state(&state, "ip", state.config.ip_policy, middleware::key_by_ip),
            middleware::rate_limit,
        ),
    );

    let mut router = Router::new()
        .merge(health_routes)
        .merge(ingest_routes)
        .merge(api_key_routes);

    if !state.config.is_production() {
        router = router.route("/metrics", get(metrics::metrics));
    }

    router.with_state(state)
}

fn bucket_state(
    state: &Arc<AppState>,
    bucket: &'static str,
    policy: RateLimitPolicy,
    key_fn: fn(&axum::http::Request<axum::body::Body>) -> String,
) -> RateLimitState {
    RateLimitState {
        counter: state.rate_counter.clone(),
        policy,
        bucket,
        key_fn,
        timeout: state.config.rate_limit_timeout,
    }
}

fn auth_gate_state(state: &Arc<AppState>, required_scope: Option<Scope>) -> AuthGateState {
    AuthGateState {
        key_registry: state.key_registry.clone(),
        lookup_timeout: state.config.auth_lookup_timeout,
        required_scope,
    }
}
