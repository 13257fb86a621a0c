//! HTTP API: request auth, rate limiting, ingestion endpoint, and the
//! admin/query surface's `/health` and `/api/v1/auth/validate`.

pub mod app;
pub mod dto;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod state;

pub use app::{build_app, build_router};
