//! Replay guard configuration.

use serde::{Deserialize, Serialize};

/// Policy applied when the backing store is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Treat the check as failed and reject the request.
    FailClosed,
    /// Let the request through with a logged warning.
    FailOpen,
}

/// Replay guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Slack added to the token's remaining validity when recording a jti,
    /// in seconds. An entry must not expire before the token itself does.
    #[serde(default = "default_ttl_margin")]
    pub ttl_margin_seconds: u64,
    /// Number of bits in the Bloom filter bitmap.
    #[serde(default = "default_filter_bits")]
    pub filter_bits: u64,
    /// Number of hash functions (bit positions per jti).
    #[serde(default = "default_hash_count")]
    pub hash_count: u32,
    /// What to do when the replay store is unreachable.
    #[serde(default = "default_on_store_error")]
    pub on_store_error: StoreFailurePolicy,
    /// Interval between expiry-index sweeps, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            ttl_margin_seconds: default_ttl_margin(),
            filter_bits: default_filter_bits(),
            hash_count: default_hash_count(),
            on_store_error: default_on_store_error(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

fn default_ttl_margin() -> u64 {
    30
}

fn default_filter_bits() -> u64 {
    1 << 24
}

fn default_hash_count() -> u32 {
    7
}

fn default_on_store_error() -> StoreFailurePolicy {
    StoreFailurePolicy::FailClosed
}

fn default_cleanup_interval() -> u64 {
    300
}
