//! In-process replay store.
//!
//! Same generational Bloom-filter shape as the Redis backend, held
//! behind a mutex. Recordings go into the current generation's bitmap;
//! membership checks look at both generations. A sweep discards a
//! generation only once every jti recorded into it has expired, and
//! rotates current to previous so the filter keeps turning over under
//! continuous traffic. The critical section never awaits, so a
//! parking_lot mutex is used rather than an async one. Timekeeping goes
//! through `tokio::time::Instant` so expiry behavior is testable with a
//! paused clock.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use shopgate_core::config::ReplayConfig;
use shopgate_core::result::AppResult;
use shopgate_core::traits::ReplayStore;

use crate::bloom::bit_positions;

#[derive(Debug)]
struct Inner {
    /// Bitmap receiving new recordings, 64 bits per word.
    current: Vec<u64>,
    /// Bitmap of the prior generation, still live until its last jti
    /// expires.
    previous: Vec<u64>,
    /// Latest expiry of any jti in the current generation.
    current_max_expiry: Option<Instant>,
    /// Latest expiry of any jti in the previous generation.
    previous_max_expiry: Option<Instant>,
    /// Expiry instant → jtis recorded with that expiry.
    index: BTreeMap<Instant, Vec<String>>,
}

impl Inner {
    fn record(&mut self, positions: &[u64], jti: &str, expiry: Instant) {
        for p in positions {
            self.current[(p / 64) as usize] |= 1u64 << (p % 64);
        }
        self.current_max_expiry = Some(match self.current_max_expiry {
            Some(current) => current.max(expiry),
            None => expiry,
        });
        self.index.entry(expiry).or_default().push(jti.to_string());
    }

    fn contains(&self, positions: &[u64]) -> bool {
        let in_bitmap = |bits: &[u64]| {
            positions
                .iter()
                .all(|p| bits[(p / 64) as usize] & (1u64 << (p % 64)) != 0)
        };
        in_bitmap(&self.current) || in_bitmap(&self.previous)
    }
}

/// In-process replay store.
#[derive(Debug)]
pub struct MemoryReplayStore {
    inner: Mutex<Inner>,
    filter_bits: u64,
    hash_count: u32,
}

impl MemoryReplayStore {
    /// Create a new in-memory replay store.
    pub fn new(config: &ReplayConfig) -> Self {
        let words = config.filter_bits.div_ceil(64) as usize;
        Self {
            inner: Mutex::new(Inner {
                current: vec![0u64; words],
                previous: vec![0u64; words],
                current_max_expiry: None,
                previous_max_expiry: None,
                index: BTreeMap::new(),
            }),
            filter_bits: config.filter_bits,
            hash_count: config.hash_count,
        }
    }
}

#[async_trait]
impl ReplayStore for MemoryReplayStore {
    async fn is_replayed(&self, jti: &str) -> AppResult<bool> {
        let positions = bit_positions(jti, self.filter_bits, self.hash_count);
        Ok(self.inner.lock().contains(&positions))
    }

    async fn record(&self, jti: &str, ttl: Duration) -> AppResult<()> {
        let positions = bit_positions(jti, self.filter_bits, self.hash_count);
        let expiry = Instant::now() + ttl;
        self.inner.lock().record(&positions, jti, expiry);
        Ok(())
    }

    async fn check_and_record(&self, jti: &str, ttl: Duration) -> AppResult<bool> {
        let positions = bit_positions(jti, self.filter_bits, self.hash_count);
        let expiry = Instant::now() + ttl;
        let mut inner = self.inner.lock();

        if inner.contains(&positions) {
            return Ok(true);
        }

        inner.record(&positions, jti, expiry);
        Ok(false)
    }

    async fn sweep_expired(&self) -> AppResult<u64> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        let live = inner.index.split_off(&now);
        let removed: u64 = inner.index.values().map(|v| v.len() as u64).sum();
        inner.index = live;

        // A generation's bits are discarded only once its last jti has
        // expired, so a recorded jti can never be reported unseen
        // before expiry.
        if inner.previous_max_expiry.is_some_and(|max| max <= now) {
            inner.previous.fill(0);
            inner.previous_max_expiry = None;
        }
        if inner.current_max_expiry.is_some_and(|max| max <= now) {
            inner.current.fill(0);
            inner.current_max_expiry = None;
        }

        // Rotate whenever the previous slot is free, so the filter
        // keeps turning over while the index is permanently nonempty.
        if inner.previous_max_expiry.is_none() && inner.current_max_expiry.is_some() {
            std::mem::swap(&mut inner.current, &mut inner.previous);
            inner.current.fill(0);
            inner.previous_max_expiry = inner.current_max_expiry.take();
        }

        if removed > 0 {
            debug!(removed, "Swept expired replay index entries");
        }
        Ok(removed)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
