//! `GET /health`: pings the three backing stores and reports `200` only if
//! all of them answer (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use errly_core::ProjectId;

use crate::dto::{HealthChecks, HealthResponse};
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let probe_project = ProjectId::new();
    let now = Utc::now();

    let key_registry = state.key_registry.get_by_hash("health-check-probe").await.is_ok();
    let event_store = state
        .event_store
        .query_events(probe_project, now..now, 1)
        .await
        .is_ok();
    let issue_store = state.issue_store.lookup(probe_project, "health-check-probe").await.is_ok();

    let checks = HealthChecks {
        key_registry,
        event_store,
        issue_store,
    };

    let status = if key_registry && event_store && issue_store {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "ok" } else { "degraded" },
            checks,
        }),
    )
        .into_response()
}
