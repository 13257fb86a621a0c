//! In-memory sliding-window `RateCounter`, for middleware tests that don't
//! want a real Redis instance.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use errly_core::ErrlyResult;

use super::RateLimitOutcome;

#[derive(Debug, Default)]
pub struct InMemoryRateCounter {
    windows: Mutex<HashMap<String, Vec<i64>>>,
}

impl InMemoryRateCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::RateCounter for InMemoryRateCounter {
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window_secs: u32,
    ) -> ErrlyResult<RateLimitOutcome> {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = i64::from(window_secs) * 1000;

        let mut windows = self.windows.lock().unwrap();
        let entries = windows.entry(key.to_string()).or_default();
        entries.retain(|&ts| ts > now_ms - window_ms);

        // spec.md §4.5: the pre-insert count decides the outcome, but the
        // request's own timestamp is recorded regardless (mirrors the
        // always-`ZADD` redis pipeline in `RedisRateCounter`).
        let pre_insert_count = entries.len() as u32;
        let allowed = pre_insert_count < limit;
        entries.push(now_ms);

        Ok(RateLimitOutcome {
            allowed,
            limit,
            remaining: limit.saturating_sub(pre_insert_count + 1),
            reset_time: (now_ms + window_ms) / 1000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateCounter;

    #[tokio::test]
    async fn allows_up_to_limit_then_blocks() {
        let counter = InMemoryRateCounter::new();
        for _ in 0..5 {
            let outcome = counter.check_and_increment("k", 5, 60).await.unwrap();
            assert!(outcome.allowed);
        }
        let outcome = counter.check_and_increment("k", 5, 60).await.unwrap();
        assert!(!outcome.allowed);
    }

    #[tokio::test]
    async fn separate_keys_are_independent() {
        let counter = InMemoryRateCounter::new();
        for _ in 0..5 {
            counter.check_and_increment("a", 5, 60).await.unwrap();
        }
        let outcome = counter.check_and_increment("b", 5, 60).await.unwrap();
        assert!(outcome.allowed);
    }
}
