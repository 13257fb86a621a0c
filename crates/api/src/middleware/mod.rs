pub mod auth_gate;
pub mod rate_limit;

pub use auth_gate::{auth_gate, ensure_scope, AuthGateState};
pub use rate_limit::{key_by_ip, key_by_project, rate_limit, RateLimitState};
