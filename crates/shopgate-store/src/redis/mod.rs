//! Redis store backend.

pub mod client;
pub mod rate_limit;
pub mod replay;

pub use client::RedisClient;
pub use rate_limit::RedisRateLimitStore;
pub use replay::RedisReplayStore;
