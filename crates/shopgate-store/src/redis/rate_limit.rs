//! Redis-backed sliding-window rate limiter using a Lua script for
//! atomicity.
//!
//! Each (limiter, client key) pair maps to a ZSET of request timestamps.
//! One script trims the trailing window, tests the count against the
//! limit, and records the new event; there is no read-then-write pair to
//! race, so arbitrary concurrent callers across process boundaries see a
//! consistent window.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::debug;

use shopgate_core::error::{AppError, ErrorKind};
use shopgate_core::result::AppResult;
use shopgate_core::traits::RateLimitStore;

use crate::redis::client::RedisClient;

/// Lua script for atomic sliding-window acquisition.
///
/// KEYS[1] = window ZSET for `<limiter>:<client_key>`
/// ARGV[1] = now (unix millis)
/// ARGV[2] = window length (millis)
/// ARGV[3] = limit
/// ARGV[4] = unique member id for this event
///
/// Returns 1 when the event was admitted, 0 when the limit is exceeded.
const ACQUIRE_SCRIPT: &str = r#"
    local now = tonumber(ARGV[1])
    local window = tonumber(ARGV[2])
    local limit = tonumber(ARGV[3])

    redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now - window)

    if redis.call('ZCARD', KEYS[1]) >= limit then
        return 0
    end

    redis.call('ZADD', KEYS[1], now, ARGV[4])
    redis.call('PEXPIRE', KEYS[1], window)
    return 1
"#;

/// Redis-backed sliding-window rate limiter for multi-node deployments.
#[derive(Debug, Clone)]
pub struct RedisRateLimitStore {
    client: RedisClient,
}

impl RedisRateLimitStore {
    /// Create a new Redis rate-limit store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn try_acquire(
        &self,
        limiter: &str,
        client_key: &str,
        window: Duration,
        limit: u32,
    ) -> AppResult<bool> {
        let key = self
            .client
            .prefixed_key(&format!("ratelimit:{limiter}:{client_key}"));

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        // Member ids must be unique so simultaneous events at the same
        // millisecond are all counted.
        let member = format!("{now_ms}-{}-{}", std::process::id(), next_seq());

        let mut conn = self.client.conn_mut();
        let result: i64 = redis::Script::new(ACQUIRE_SCRIPT)
            .key(&key)
            .arg(now_ms)
            .arg(window.as_millis() as u64)
            .arg(limit)
            .arg(&member)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        let admitted = result == 1;
        if !admitted {
            debug!(limiter, client_key, limit, "Rate limit window full");
        }
        Ok(admitted)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}

/// Cheap per-call unique suffix; combined with the process id, collision
/// only matters within one millisecond for one client key.
fn next_seq() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
