//! `RateCounter`: the sliding-window counter behind every rate-limit bucket
//! (spec.md §4.5).

mod in_memory;
mod redis_counter;

use std::sync::Arc;

use async_trait::async_trait;

use errly_core::ErrlyResult;

pub use in_memory::InMemoryRateCounter;
pub use redis_counter::RedisRateCounter;

/// Outcome of a single rate-limit check (spec.md §4.5: the response carries
/// the limit, what's used, and when the window resets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: i64,
}

#[async_trait]
pub trait RateCounter: Send + Sync {
    /// Record one request against `key` and report whether it's within
    /// `limit` requests per `window_secs` (spec.md §4.5's sliding window
    /// algorithm). Implementations must fail open: if the counter itself
    /// is unreachable, the request is allowed rather than rejected
    /// (spec.md §4.5, §7 — availability of ingestion outranks exactness of
    /// quota enforcement).
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window_secs: u32,
    ) -> ErrlyResult<RateLimitOutcome>;
}

#[async_trait]
impl<T> RateCounter for Arc<T>
where
    T: RateCounter + ?Sized,
{
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window_secs: u32,
    ) -> ErrlyResult<RateLimitOutcome> {
        (**self).check_and_increment(key, limit, window_secs).await
    }
}
