//! The ingestion pipeline: normalize → fingerprint & group → persist events
//! → upsert issues (spec.md §4.7).
//!
//! This crate has no IO of its own (mirrors `command_dispatcher.rs`'s
//! "application-level orchestration, no IO itself" split): it composes the
//! `EventStore`/`IssueStore` traits from errly-infra and is exercised in
//! tests against their in-memory fakes.

mod normalize;
mod service;

pub use normalize::normalize;
pub use service::{IngestService, IngestSummary};
