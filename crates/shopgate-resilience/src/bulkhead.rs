//! Bounded-concurrency bulkhead.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use shopgate_core::config::OperationPolicyConfig;

use crate::error::ResilienceError;

/// Caps in-flight calls for one operation. Callers wait a bounded
/// time for a slot and are rejected when none frees up.
#[derive(Debug)]
pub struct Bulkhead {
    operation: String,
    slots: Arc<Semaphore>,
    max_wait: Duration,
}

impl Bulkhead {
    pub fn from_config(config: &OperationPolicyConfig) -> Self {
        Self {
            operation: config.name.clone(),
            slots: Arc::new(Semaphore::new(config.max_concurrent.max(1) as usize)),
            max_wait: Duration::from_millis(config.max_wait_ms),
        }
    }

    /// Acquire a slot, waiting at most the configured time. The slot
    /// is released when the returned permit is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, ResilienceError> {
        let acquire = Arc::clone(&self.slots).acquire_owned();
        match tokio::time::timeout(self.max_wait, acquire).await {
            Ok(Ok(permit)) => Ok(permit),
            // Elapsed, or the semaphore was closed (never done here).
            _ => {
                debug!(operation = %self.operation, "Bulkhead saturated, rejecting call");
                Err(ResilienceError::BulkheadFull {
                    operation: self.operation.clone(),
                })
            }
        }
    }

    /// Currently free slots.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}
