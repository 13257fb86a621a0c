//! Maps `ErrlyError` to the JSON error envelope spec.md §6/§7 defines:
//! `{"error": <message>, "code": <code>}`, with quota errors additionally
//! carrying the rate-limit headers. Mirrors `app/errors.rs`'s
//! `dispatch_error_to_response`/`json_error` split.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use errly_core::ErrlyError;

pub fn error_response(err: ErrlyError) -> Response {
    match err {
        ErrlyError::ClientFormat { code, message } => json_error(StatusCode::BAD_REQUEST, code, message),
        ErrlyError::Auth { code, message } => {
            // spec.md §7: every Auth code is 401 except INSUFFICIENT_SCOPE,
            // which is 403 ("the key is known and valid, but isn't allowed").
            let status = if code == "INSUFFICIENT_SCOPE" {
                StatusCode::FORBIDDEN
            } else {
                StatusCode::UNAUTHORIZED
            };
            json_error(status, code, message)
        }
        ErrlyError::Ingest { code, message } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, message)
        }
        ErrlyError::Backend { code, message } => {
            // spec.md §7: INTERNAL_ERROR -> 500, SERVICE_UNAVAILABLE -> 503.
            let status = if code == "SERVICE_UNAVAILABLE" {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            json_error(status, code, message)
        }
        ErrlyError::Quota {
            code,
            message,
            limit,
            window_secs,
            reset_time,
            retry_after_secs,
        } => {
            // spec.md §6: rate-limit bodies additionally carry `limit`,
            // `window`, `reset_time` alongside the usual error envelope.
            let body = axum::Json(json!({
                "error": message,
                "code": code,
                "limit": limit,
                "window": window_secs,
                "reset_time": reset_time,
            }));
            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            let headers = response.headers_mut();
            insert_header(headers, "x-ratelimit-limit", limit);
            insert_header(headers, "x-ratelimit-remaining", 0);
            insert_header(headers, "x-ratelimit-reset", reset_time);
            insert_header(headers, "retry-after", retry_after_secs.max(0));
            response
        }
    }
}

fn insert_header(headers: &mut axum::http::HeaderMap, name: &'static str, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "code": code,
        })),
    )
        .into_response()
}
