//! # shopgate-resilience
//!
//! Resilience guards for outbound dependency calls. Each named
//! operation gets an independent [`OperationGuard`] combining four
//! mechanisms, applied in a fixed order per attempt:
//!
//! 1. circuit breaker (fail fast while the dependency is unhealthy)
//! 2. bulkhead (bounded concurrency with a bounded wait)
//! 3. timeout (abandon slow calls)
//! 4. retry (bounded attempts with backoff between them)
//!
//! Guards are built from [`shopgate_core::config::ResilienceConfig`]
//! and looked up by operation name through [`ResilienceRegistry`].

pub mod breaker;
pub mod bulkhead;
pub mod error;
pub mod registry;
pub mod retry;

pub use breaker::{CircuitBreaker, CircuitState};
pub use bulkhead::Bulkhead;
pub use error::ResilienceError;
pub use registry::{OperationGuard, ResilienceRegistry};
pub use retry::RetryPolicy;
