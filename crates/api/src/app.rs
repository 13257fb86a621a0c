//! Application wiring: storage adapters → `AppState` → router (mirrors
//! `app/mod.rs`'s `build_app`, generalized to Errly's backends).

use std::sync::Arc;

use axum::http::{HeaderName, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use errly_infra::events_store::ClickHouseEventStore;
use errly_infra::issue_store::ClickHouseIssueStore;
use errly_infra::key_registry::PostgresKeyRegistry;
use errly_infra::rate_limit::RedisRateCounter;
use errly_infra::{pools, Config};

use crate::routes;
use crate::state::AppState;

/// Build the full HTTP router against real backends (the binary's entrypoint).
pub async fn build_app(config: Config) -> errly_core::ErrlyResult<Router> {
    let config = Arc::new(config);

    let pg_pool = pools::connect_postgres(&config).await?;
    let clickhouse = pools::connect_clickhouse(&config);
    let redis_conn = pools::connect_redis(&config).await?;

    let metrics_handle = (!config.is_production()).then(errly_observability::metrics::init);

    let state = Arc::new(AppState::with_metrics(
        config,
        Arc::new(PostgresKeyRegistry::new(pg_pool)),
        Arc::new(ClickHouseEventStore::new(clickhouse.clone())),
        Arc::new(ClickHouseIssueStore::new(clickhouse)),
        Arc::new(RedisRateCounter::new(redis_conn)),
        metrics_handle,
    ));

    Ok(build_router(state))
}

/// Assemble the router around an already-constructed `AppState` (the seam
/// both `build_app` and the black-box integration tests use, so tests can
/// substitute in-memory fakes for `AppState`'s storage fields without
/// touching routing or middleware).
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    routes::router(state).layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}

/// spec.md §6: allowed origins are configurable; the method/header set is
/// fixed and always includes `Authorization`, with `X-RateLimit-*` exposed
/// so browser clients can read it off a successful response.
fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.cors_allowed_origins.is_empty() {
        if config.is_production() {
            AllowOrigin::list(Vec::new())
        } else {
            AllowOrigin::any()
        }
    } else {
        AllowOrigin::list(
            config
                .cors_allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
        ])
}
