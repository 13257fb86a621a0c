//! `POST /api/v1/auth/validate` — lets a client check its key's validity
//! and scopes without attempting an actual operation (spec.md §4.4).

use axum::extract::Extension;
use axum::Json;

use errly_auth::Principal;

use crate::dto::AuthValidateResponse;

pub async fn validate(Extension(principal): Extension<Principal>) -> Json<AuthValidateResponse> {
    Json(AuthValidateResponse {
        valid: true,
        project_id: principal.project_id().to_string(),
        scopes: principal
            .api_key
            .scopes
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })
}
