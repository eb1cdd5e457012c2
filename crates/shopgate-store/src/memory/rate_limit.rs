//! In-process sliding-window rate limiter.
//!
//! Each (limiter, client key) pair owns a deque of event instants; the
//! dashmap entry guard makes acquisition atomic per key. Timekeeping
//! goes through `tokio::time::Instant` for paused-clock tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use shopgate_core::config::MemoryStoreConfig;
use shopgate_core::result::AppResult;
use shopgate_core::traits::RateLimitStore;

/// Event history of one (limiter, client key) pair. Each entry keeps
/// its own window length so eviction never judges a key by another
/// limiter's window.
#[derive(Debug)]
struct KeyWindow {
    window: Duration,
    events: VecDeque<Instant>,
}

/// In-process sliding-window rate limiter.
#[derive(Debug)]
pub struct MemoryRateLimitStore {
    /// `<limiter>:<client_key>` → event instants within the window.
    windows: DashMap<String, KeyWindow>,
    /// Soft cap on tracked keys; stale keys are dropped opportunistically.
    max_tracked_keys: u64,
}

impl MemoryRateLimitStore {
    /// Create a new in-memory rate-limit store.
    pub fn new(config: &MemoryStoreConfig) -> Self {
        Self {
            windows: DashMap::new(),
            max_tracked_keys: config.max_tracked_keys,
        }
    }

    /// Drop keys whose own windows are fully drained. Called when the
    /// map grows past the soft cap; correctness never depends on it.
    fn evict_drained(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, kw| kw.events.back().is_some_and(|t| *t + kw.window > now));
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn try_acquire(
        &self,
        limiter: &str,
        client_key: &str,
        window: Duration,
        limit: u32,
    ) -> AppResult<bool> {
        if self.windows.len() as u64 > self.max_tracked_keys {
            self.evict_drained();
        }

        let key = format!("{limiter}:{client_key}");
        let now = Instant::now();

        let mut entry = self.windows.entry(key).or_insert_with(|| KeyWindow {
            window,
            events: VecDeque::new(),
        });
        entry.window = window;

        // Trim everything outside the trailing window.
        while entry.events.front().is_some_and(|t| *t + window <= now) {
            entry.events.pop_front();
        }

        if entry.events.len() >= limit as usize {
            debug!(limiter, client_key, limit, "Rate limit window full");
            return Ok(false);
        }

        entry.events.push_back(now);
        Ok(true)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
