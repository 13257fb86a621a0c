//! Process-wide service wiring, built once at startup (mirrors
//! `app/services.rs`'s role, generalized to Errly's storage traits).

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use errly_infra::{Config, EventStore, IssueStore, KeyRegistry, RateCounter};
use errly_ingest::IngestService;

pub type DynIngestService = IngestService<Arc<dyn EventStore>, Arc<dyn IssueStore>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub key_registry: Arc<dyn KeyRegistry>,
    pub event_store: Arc<dyn EventStore>,
    pub issue_store: Arc<dyn IssueStore>,
    pub rate_counter: Arc<dyn RateCounter>,
    pub ingest_service: Arc<DynIngestService>,
    /// `None` when metrics weren't installed for this process (e.g. a test
    /// state built without calling `errly_observability::metrics::init`).
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        key_registry: Arc<dyn KeyRegistry>,
        event_store: Arc<dyn EventStore>,
        issue_store: Arc<dyn IssueStore>,
        rate_counter: Arc<dyn RateCounter>,
    ) -> Self {
        Self::with_metrics(config, key_registry, event_store, issue_store, rate_counter, None)
    }

    pub fn with_metrics(
        config: Arc<Config>,
        key_registry: Arc<dyn KeyRegistry>,
        event_store: Arc<dyn EventStore>,
        issue_store: Arc<dyn IssueStore>,
        rate_counter: Arc<dyn RateCounter>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        let ingest_service = Arc::new(IngestService::new(
            event_store.clone(),
            issue_store.clone(),
            config.event_store_timeout,
            config.issue_store_timeout,
        ));

        Self {
            config,
            key_registry,
            event_store,
            issue_store,
            rate_counter,
            ingest_service,
            metrics_handle,
        }
    }
}
