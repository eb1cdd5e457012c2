//! Replay store trait for pluggable probabilistic-set backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for replay-set backends (Redis bitmap Bloom filter or in-memory).
///
/// The set is probabilistic: `is_replayed` may return `true` for a jti
/// that was never recorded (false positive, rate bounded by filter
/// sizing) but must never return `false` for a jti recorded within its
/// ttl (no false negatives before expiry).
#[async_trait]
pub trait ReplayStore: Send + Sync + std::fmt::Debug + 'static {
    /// Membership test. Does not modify the set.
    async fn is_replayed(&self, jti: &str) -> AppResult<bool>;

    /// Record a jti with the given time-to-live. Must be called exactly
    /// once per newly validated token.
    async fn record(&self, jti: &str, ttl: Duration) -> AppResult<()>;

    /// Combined test-and-record used on the hot path. Returns `true` if
    /// the jti was already present. Implementations make this atomic per
    /// jti (a single server-side script for Redis); concurrent callers
    /// with the *same* jti race only within one store round-trip.
    async fn check_and_record(&self, jti: &str, ttl: Duration) -> AppResult<bool>;

    /// Drop expired entries from the companion expiry index. Returns the
    /// number of entries removed.
    async fn sweep_expired(&self) -> AppResult<u64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
