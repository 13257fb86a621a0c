//! Storage adapters and process wiring: `KeyRegistry` (Postgres),
//! `EventStore` and `IssueStore` (ClickHouse), `RateCounter` (Redis), plus
//! configuration and connection-pool construction (spec.md §6, §9
//! Re-architecture guidance).
//!
//! Each capability trait here is `#[async_trait]`, not the sync
//! `Handle::block_on`-bridged style the rest of this workspace uses
//! elsewhere — spec.md §5 requires real cancellation and per-call
//! deadlines on every outbound dependency, which only works if the trait
//! itself is async all the way through (SPEC_FULL.md §6.1).

pub mod config;
pub mod events_store;
pub mod issue_store;
pub mod key_registry;
pub mod pools;
pub mod rate_limit;

pub use config::Config;
pub use events_store::EventStore;
pub use issue_store::IssueStore;
pub use key_registry::KeyRegistry;
pub use rate_limit::{RateCounter, RateLimitOutcome};
