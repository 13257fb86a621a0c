//! Rate-limit middleware: applies one bucket policy per request
//! (spec.md §4.5's table of buckets).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

use errly_auth::Principal;
use errly_core::ErrlyError;
use errly_infra::config::RateLimitPolicy;
use errly_infra::RateCounter;

use crate::errors::error_response;

#[derive(Clone)]
pub struct RateLimitState {
    pub counter: Arc<dyn RateCounter>,
    pub policy: RateLimitPolicy,
    pub bucket: &'static str,
    pub key_fn: fn(&Request<axum::body::Body>) -> String,
    /// Bound on the `RateCounter::check_and_increment` round-trip
    /// (spec.md §5: 2 s). A timeout is treated the same as any other
    /// counter-store error: fail open.
    pub timeout: Duration,
}

/// Keys on the authenticated principal's project (spec.md §4.5: per-key
/// and per-project-ingest buckets). Requires `AuthGate` to run first.
pub fn key_by_project(req: &Request<axum::body::Body>) -> String {
    req.extensions()
        .get::<Principal>()
        .map(|p| p.project_id().to_string())
        .unwrap_or_else(|| "unauthenticated".to_string())
}

/// Keys on the caller's IP (spec.md §4.5: per-IP bucket, runs before auth).
pub fn key_by_ip(req: &Request<axum::body::Body>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(state): State<RateLimitState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let key = format!("{}:{}", state.bucket, (state.key_fn)(&req));

    let outcome = tokio::time::timeout(
        state.timeout,
        state.counter.check_and_increment(&key, state.policy.limit, state.policy.window_secs),
    )
    .await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(_) => {
            // Fail-open (spec.md §4.5): same policy as a counter-store error.
            tracing::warn!(bucket = state.bucket, "rate counter timed out, allowing request");
            return next.run(req).await;
        }
    };

    match outcome {
        Ok(outcome) if outcome.allowed => {
            // spec.md §6: every authenticated response carries the
            // rate-limit headers, not just rejections.
            let mut response = next.run(req).await;
            insert_header(response.headers_mut(), "x-ratelimit-limit", outcome.limit);
            insert_header(response.headers_mut(), "x-ratelimit-remaining", outcome.remaining);
            insert_header(response.headers_mut(), "x-ratelimit-reset", outcome.reset_time);
            response
        }
        Ok(outcome) => {
            errly_observability::metrics::record_rate_limit_rejection(state.bucket);
            error_response(ErrlyError::Quota {
                code: "RATE_LIMIT_EXCEEDED",
                message: format!("rate limit exceeded for bucket '{}'", state.bucket),
                limit: outcome.limit,
                window_secs: state.policy.window_secs,
                reset_time: outcome.reset_time,
                retry_after_secs: outcome.reset_time - chrono::Utc::now().timestamp(),
            })
        }
        Err(error) => {
            // Fail-open (spec.md §4.5): the counter store itself is
            // unreachable, not the caller at fault. Allow the request and
            // log; the response just won't carry accurate remaining-count
            // headers for this one check.
            tracing::warn!(%error, bucket = state.bucket, "rate counter unavailable, allowing request");
            next.run(req).await
        }
    }
}

fn insert_header(headers: &mut axum::http::HeaderMap, name: &'static str, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), value);
    }
}
