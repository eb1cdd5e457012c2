//! In-memory store backend for single-node deployments and tests.

pub mod rate_limit;
pub mod replay;

pub use rate_limit::MemoryRateLimitStore;
pub use replay::MemoryReplayStore;
