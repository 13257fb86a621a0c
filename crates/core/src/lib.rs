//! Core domain types shared by every Errly crate: identifiers, the error
//! taxonomy, and the small value types (`Level`, `Scope`, `IssueStatus`)
//! that make up the data model of spec.md §3.
//!
//! Deliberately free of any IO or framework dependency so it can be
//! depended on by both the storage adapters and the HTTP layer without
//! pulling either into the other.

pub mod error;
pub mod id;
pub mod level;
pub mod scope;
pub mod status;

pub use error::{ErrlyError, ErrlyResult};
pub use id::{ApiKeyId, EventId, IssueId, ProjectId};
pub use level::Level;
pub use scope::Scope;
pub use status::IssueStatus;
