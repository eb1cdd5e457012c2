//! Rate-limit store trait for pluggable sliding-window backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for sliding-window rate-limiter backends.
///
/// `try_acquire` is a single atomic increment-and-test: it either admits
/// the event and records it, or rejects it leaving the window untouched.
/// There is never a separate read-then-write pair.
#[async_trait]
pub trait RateLimitStore: Send + Sync + std::fmt::Debug + 'static {
    /// Atomically test whether one more event is permitted for
    /// `client_key` within the trailing `window` for `limiter`, and if
    /// so record it. Returns `false` when the limit is exceeded.
    async fn try_acquire(
        &self,
        limiter: &str,
        client_key: &str,
        window: Duration,
        limit: u32,
    ) -> AppResult<bool>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
