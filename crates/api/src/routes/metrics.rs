//! `GET /metrics`: Prometheus text exposition (SPEC_FULL.md §6.1).
//!
//! Only mounted in `development` — `ENVIRONMENT=production` disables this
//! route the same way it disables the rest of the `/debug` group
//! (spec.md §6's configuration table).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
