//! API key model, token format, and the authenticated-request identity
//! (spec.md §3, §4.2, §4.4).

pub mod api_key;
pub mod principal;
pub mod token;

pub use api_key::ApiKey;
pub use principal::Principal;
pub use token::{hash_token, key_prefix, validate_format, TokenValidationError};
