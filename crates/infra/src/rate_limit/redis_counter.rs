//! Redis-backed sliding-window `RateCounter` (spec.md §4.5).
//!
//! Each key is a sorted set; score and member are both the request's
//! arrival time in milliseconds (made unique with a counter suffix so
//! concurrent requests in the same millisecond don't collide). A check is
//! one pipelined round trip running all four of spec.md §4.5's steps
//! unconditionally:
//!
//! 1. `ZREMRANGEBYSCORE key 0 (now - window)` — drop everything outside
//!    the window.
//! 2. `ZCARD key` — read the count *before* this request's own entry lands.
//! 3. `ZADD key now member` — record this request, win or lose.
//! 4. `EXPIRE key window + 60s` — refresh the TTL.
//!
//! The pre-insert count from step 2 is what gets compared against `limit`
//! (spec.md §4.5: "the pre-insert count is compared to the limit") — a
//! rejected request still occupies a slot in the window, so a client can't
//! dodge its own quota by having rejected calls go uncounted.
//! Redis errors are swallowed and treated as "allow" — see the trait doc on
//! `RateCounter::check_and_increment`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use errly_core::ErrlyResult;

use super::RateLimitOutcome;

const KEY_PREFIX: &str = "errly:ratelimit:";

#[derive(Clone)]
pub struct RedisRateCounter {
    conn: ConnectionManager,
    tie_breaker: std::sync::Arc<AtomicU64>,
}

impl RedisRateCounter {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            tie_breaker: std::sync::Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl super::RateCounter for RedisRateCounter {
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window_secs: u32,
    ) -> ErrlyResult<RateLimitOutcome> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_ms = i64::from(window_secs) * 1000;
        let redis_key = format!("{KEY_PREFIX}{key}");
        let reset_time = (now_ms + window_ms) / 1000;

        let tie = self.tie_breaker.fetch_add(1, Ordering::Relaxed) % 1000;
        let member = format!("{now_ms}-{tie}");

        // spec.md §4.5 step 4: TTL is refreshed to `window + 1 minute`, not
        // just the window, so a key that goes idle right at its boundary
        // doesn't get evicted mid-count on the next burst.
        let ttl_secs = i64::from(window_secs) + 60;

        let mut conn = self.conn.clone();
        let result: redis::RedisResult<(u64,)> = async {
            let mut pipe = redis::pipe();
            pipe.atomic()
                .zrembyscore(&redis_key, 0, now_ms - window_ms)
                .ignore()
                .zcard(&redis_key)
                .zadd(&redis_key, &member, now_ms)
                .ignore()
                .expire(&redis_key, ttl_secs)
                .ignore();
            pipe.query_async(&mut conn).await
        }
        .await;

        let count = match result {
            Ok((count,)) => count,
            Err(error) => {
                tracing::warn!(%error, "rate limit counter unreachable, failing open");
                return Ok(RateLimitOutcome {
                    allowed: true,
                    limit,
                    remaining: limit,
                    reset_time,
                });
            }
        };

        if count >= u64::from(limit) {
            return Ok(RateLimitOutcome {
                allowed: false,
                limit,
                remaining: 0,
                reset_time,
            });
        }

        Ok(RateLimitOutcome {
            allowed: true,
            limit,
            remaining: limit - (count as u32 + 1),
            reset_time,
        })
    }
}
