//! Metrics setup and the named instruments the API layer records against
//! (SPEC_FULL.md §6.1).

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const EVENTS_INGESTED_TOTAL: &str = "errly_ingest_events_total";
pub const INGEST_BATCHES_TOTAL: &str = "errly_ingest_batches_total";
pub const INGEST_BATCH_DURATION_SECONDS: &str = "errly_ingest_batch_duration_seconds";
pub const AUTH_FAILURES_TOTAL: &str = "errly_auth_failures_total";
pub const RATE_LIMIT_REJECTIONS_TOTAL: &str = "errly_rate_limit_rejections_total";

/// Install the process-wide Prometheus recorder. Returns the handle so
/// `errly-api` can render a snapshot on demand at `GET /metrics` (gated to
/// `development`, SPEC_FULL.md §6.1) instead of the exporter owning its
/// own listening socket.
pub fn init() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install prometheus recorder")
}

pub fn record_events_ingested(project_id: &str, count: u64) {
    metrics::counter!(EVENTS_INGESTED_TOTAL, "project_id" => project_id.to_string())
        .increment(count);
}

pub fn record_ingest_batch(result: &'static str) {
    metrics::counter!(INGEST_BATCHES_TOTAL, "result" => result).increment(1);
}

pub fn record_ingest_duration(seconds: f64) {
    metrics::histogram!(INGEST_BATCH_DURATION_SECONDS).record(seconds);
}

pub fn record_auth_failure(reason: &'static str) {
    metrics::counter!(AUTH_FAILURES_TOTAL, "reason" => reason).increment(1);
}

pub fn record_rate_limit_rejection(bucket: &'static str) {
    metrics::counter!(RATE_LIMIT_REJECTIONS_TOTAL, "bucket" => bucket).increment(1);
}
