//! Redis-backed replay store using Lua scripts for atomicity.
//!
//! The "seen" set is a generational Bloom filter over two plain Redis
//! bitmaps. Bit positions are derived client-side (see [`crate::bloom`])
//! and tested and set inside a single script, so concurrent requests
//! presenting the same jti race only within one store round-trip.
//! Recordings go into the current generation; membership checks look at
//! both. A companion ZSET scored by absolute expiry instant is the
//! time-ordered cleanup index, and per-generation max-expiry keys gate
//! rotation: a generation's bitmap is deleted only once its last jti
//! has expired, and current rotates to previous whenever the previous
//! slot is free. Stale bits between rotations can only cause false
//! positives, never false negatives.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::{debug, info};

use shopgate_core::config::ReplayConfig;
use shopgate_core::error::{AppError, ErrorKind};
use shopgate_core::result::AppResult;
use shopgate_core::traits::ReplayStore;

use crate::bloom::bit_positions;
use crate::redis::client::RedisClient;

/// Suffix for the current-generation bitmap key.
const CURRENT_FILTER_KEY: &str = "replay:filter:current";
/// Suffix for the previous-generation bitmap key.
const PREVIOUS_FILTER_KEY: &str = "replay:filter:previous";
/// Suffix for the expiry-ordered index key.
const INDEX_KEY: &str = "replay:index";
/// Suffix for the current generation's max-expiry key (unix millis).
const CURRENT_MAX_KEY: &str = "replay:gen:current";
/// Suffix for the previous generation's max-expiry key (unix millis).
const PREVIOUS_MAX_KEY: &str = "replay:gen:previous";

/// Lua script for the atomic check-and-record.
///
/// KEYS[1] = current bitmap
/// KEYS[2] = previous bitmap
/// KEYS[3] = expiry index (ZSET)
/// KEYS[4] = current max-expiry
/// ARGV[1] = jti
/// ARGV[2] = absolute expiry (unix millis)
/// ARGV[3..] = bit offsets
///
/// Returns 1 when the jti was already present, 0 when it was recorded.
const CHECK_AND_RECORD_SCRIPT: &str = r#"
    local function all_set(key)
        for i = 3, #ARGV do
            if redis.call('GETBIT', key, ARGV[i]) == 0 then
                return false
            end
        end
        return true
    end
    if all_set(KEYS[1]) or all_set(KEYS[2]) then
        return 1
    end
    for i = 3, #ARGV do
        redis.call('SETBIT', KEYS[1], ARGV[i], 1)
    end
    redis.call('ZADD', KEYS[3], ARGV[2], ARGV[1])
    if tonumber(ARGV[2]) > tonumber(redis.call('GET', KEYS[4]) or '0') then
        redis.call('SET', KEYS[4], ARGV[2])
    end
    return 0
"#;

/// Lua script for the read-only membership test. KEYS = both bitmaps,
/// ARGV = bit offsets.
const IS_REPLAYED_SCRIPT: &str = r#"
    local function all_set(key)
        for i = 1, #ARGV do
            if redis.call('GETBIT', key, ARGV[i]) == 0 then
                return false
            end
        end
        return true
    end
    if all_set(KEYS[1]) or all_set(KEYS[2]) then
        return 1
    end
    return 0
"#;

/// Lua script for recording without a prior check. KEYS[1] = current
/// bitmap, KEYS[2] = index, KEYS[3] = current max-expiry.
const RECORD_SCRIPT: &str = r#"
    for i = 3, #ARGV do
        redis.call('SETBIT', KEYS[1], ARGV[i], 1)
    end
    redis.call('ZADD', KEYS[2], ARGV[2], ARGV[1])
    if tonumber(ARGV[2]) > tonumber(redis.call('GET', KEYS[3]) or '0') then
        redis.call('SET', KEYS[3], ARGV[2])
    end
    return 1
"#;

/// Lua script for the expiry sweep. Removes elapsed index entries,
/// deletes each generation once its last jti has expired, and rotates
/// current to previous whenever the previous slot is free. Rotation
/// therefore keeps happening under continuous traffic; it never waits
/// for an empty index.
///
/// KEYS[1] = current bitmap, KEYS[2] = previous bitmap, KEYS[3] = index,
/// KEYS[4] = current max-expiry, KEYS[5] = previous max-expiry,
/// ARGV[1] = now (unix millis).
const SWEEP_SCRIPT: &str = r#"
    local now = tonumber(ARGV[1])
    local removed = redis.call('ZREMRANGEBYSCORE', KEYS[3], '-inf', now)
    local prev_max = tonumber(redis.call('GET', KEYS[5]) or '0')
    if prev_max > 0 and prev_max <= now then
        redis.call('DEL', KEYS[2], KEYS[5])
        prev_max = 0
    end
    local cur_max = tonumber(redis.call('GET', KEYS[4]) or '0')
    if cur_max > 0 and cur_max <= now then
        redis.call('DEL', KEYS[1], KEYS[4])
        cur_max = 0
    end
    if prev_max == 0 and cur_max > 0 then
        if redis.call('EXISTS', KEYS[1]) == 1 then
            redis.call('RENAME', KEYS[1], KEYS[2])
        end
        redis.call('SET', KEYS[5], cur_max)
        redis.call('DEL', KEYS[4])
    end
    return removed
"#;

/// Redis-backed replay store for multi-node deployments.
#[derive(Debug, Clone)]
pub struct RedisReplayStore {
    client: RedisClient,
    filter_bits: u64,
    hash_count: u32,
}

impl RedisReplayStore {
    /// Create a new Redis replay store.
    pub fn new(client: RedisClient, config: &ReplayConfig) -> Self {
        Self {
            client,
            filter_bits: config.filter_bits,
            hash_count: config.hash_count,
        }
    }

    fn current_filter_key(&self) -> String {
        self.client.prefixed_key(CURRENT_FILTER_KEY)
    }

    fn previous_filter_key(&self) -> String {
        self.client.prefixed_key(PREVIOUS_FILTER_KEY)
    }

    fn index_key(&self) -> String {
        self.client.prefixed_key(INDEX_KEY)
    }

    fn current_max_key(&self) -> String {
        self.client.prefixed_key(CURRENT_MAX_KEY)
    }

    fn previous_max_key(&self) -> String {
        self.client.prefixed_key(PREVIOUS_MAX_KEY)
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }

    fn expiry_millis(ttl: Duration) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        (now + ttl).as_millis() as u64
    }
}

#[async_trait]
impl ReplayStore for RedisReplayStore {
    async fn is_replayed(&self, jti: &str) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let script = redis::Script::new(IS_REPLAYED_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation
            .key(self.current_filter_key())
            .key(self.previous_filter_key());
        for offset in bit_positions(jti, self.filter_bits, self.hash_count) {
            invocation.arg(offset);
        }
        let result: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(result == 1)
    }

    async fn record(&self, jti: &str, ttl: Duration) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let script = redis::Script::new(RECORD_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation
            .key(self.current_filter_key())
            .key(self.index_key())
            .key(self.current_max_key())
            .arg(jti)
            .arg(Self::expiry_millis(ttl));
        for offset in bit_positions(jti, self.filter_bits, self.hash_count) {
            invocation.arg(offset);
        }
        let _: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn check_and_record(&self, jti: &str, ttl: Duration) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let script = redis::Script::new(CHECK_AND_RECORD_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation
            .key(self.current_filter_key())
            .key(self.previous_filter_key())
            .key(self.index_key())
            .key(self.current_max_key())
            .arg(jti)
            .arg(Self::expiry_millis(ttl));
        for offset in bit_positions(jti, self.filter_bits, self.hash_count) {
            invocation.arg(offset);
        }
        let result: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(seen = result == 1, "Replay check-and-record");
        Ok(result == 1)
    }

    async fn sweep_expired(&self) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let now_ms = Self::expiry_millis(Duration::ZERO);
        let removed: i64 = redis::Script::new(SWEEP_SCRIPT)
            .key(self.current_filter_key())
            .key(self.previous_filter_key())
            .key(self.index_key())
            .key(self.current_max_key())
            .key(self.previous_max_key())
            .arg(now_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        if removed > 0 {
            info!(removed, "Swept expired replay index entries");
        }
        Ok(removed as u64)
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
