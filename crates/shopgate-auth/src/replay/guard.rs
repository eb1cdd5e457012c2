//! Replay guard over a probabilistic jti set.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use shopgate_core::config::{ReplayConfig, StoreFailurePolicy};
use shopgate_core::error::AppError;
use shopgate_core::result::AppResult;
use shopgate_core::traits::ReplayStore;

use crate::token::Claims;

/// Rejects tokens whose jti has been seen before.
///
/// Each jti is recorded for the token's remaining validity plus a
/// configured margin, so an entry never expires before the token it
/// covers. The backing set is probabilistic: a fresh token may rarely
/// be rejected as a replay (false positive), a recorded one is never
/// let through before its entry expires.
///
/// Two concurrent requests with the same jti can both pass within a
/// single store round-trip; the store makes the test-and-record atomic
/// per jti but not across the network race.
#[derive(Debug, Clone)]
pub struct ReplayGuard {
    store: Arc<dyn ReplayStore>,
    config: ReplayConfig,
}

impl ReplayGuard {
    pub fn new(store: Arc<dyn ReplayStore>, config: ReplayConfig) -> Self {
        Self { store, config }
    }

    /// Hot-path check: record the jti and reject if it was already
    /// present. The store-unreachable policy is applied here and
    /// nowhere else.
    pub async fn check(&self, claims: &Claims) -> AppResult<()> {
        let ttl = claims.remaining_validity()
            + Duration::from_secs(self.config.ttl_margin_seconds);
        let jti = claims.jti.to_string();

        match self.store.check_and_record(&jti, ttl).await {
            Ok(false) => Ok(()),
            Ok(true) => {
                debug!(jti = %claims.jti, "Replayed token rejected");
                Err(AppError::replay_detected("Token has already been used"))
            }
            Err(e) => match self.config.on_store_error {
                StoreFailurePolicy::FailClosed => {
                    error!(error = %e, "Replay store unreachable, failing closed");
                    Err(AppError::service_unavailable("Replay check unavailable"))
                }
                StoreFailurePolicy::FailOpen => {
                    warn!(error = %e, "Replay store unreachable, failing open");
                    Ok(())
                }
            },
        }
    }

    pub fn store(&self) -> Arc<dyn ReplayStore> {
        Arc::clone(&self.store)
    }
}
