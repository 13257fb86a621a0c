//! `POST /api/v1/ingest` and `GET /api/v1/ingest/info` (spec.md §4.8).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use errly_auth::Principal;
use errly_core::{ErrlyError, Scope};
use errly_events::{IngestRequest, MAX_BATCH_SIZE, MIN_BATCH_SIZE};

use crate::dto::{IngestInfoResponse, IngestResponse};
use crate::errors::error_response;
use crate::middleware::ensure_scope;
use crate::state::AppState;

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Response {
    if let Err(response) = ensure_scope(&principal, Scope::Ingest) {
        return response;
    }

    let Json(body) = match body {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(ErrlyError::client_format_coded("BAD_REQUEST", rejection.to_string()));
        }
    };

    if body.events.len() < MIN_BATCH_SIZE || body.events.len() > MAX_BATCH_SIZE {
        return error_response(ErrlyError::client_format_coded(
            "BAD_REQUEST",
            format!(
                "batch must contain between {MIN_BATCH_SIZE} and {MAX_BATCH_SIZE} events, got {}",
                body.events.len()
            ),
        ));
    }

    for event in &body.events {
        if let Err(error) = event.validate() {
            return error_response(error);
        }
    }

    let project_id = principal.project_id();
    match state.ingest_service.ingest(project_id, body.events).await {
        Ok(summary) => {
            errly_observability::metrics::record_events_ingested(
                &project_id.to_string(),
                summary.accepted as u64,
            );
            (
                StatusCode::ACCEPTED,
                Json(IngestResponse {
                    accepted: summary.accepted,
                    issue_ids: summary.issue_ids,
                }),
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

pub async fn ingest_info(Extension(principal): Extension<Principal>) -> Response {
    if let Err(response) = ensure_scope(&principal, Scope::Ingest) {
        return response;
    }

    Json(IngestInfoResponse {
        min_batch_size: MIN_BATCH_SIZE,
        max_batch_size: MAX_BATCH_SIZE,
        accepted_timestamp_formats: &[
            "RFC3339",
            "RFC3339 with fractional seconds",
            "ISO-8601 without timezone (UTC assumed)",
            "ISO-8601 with microseconds",
        ],
    })
    .into_response()
}
