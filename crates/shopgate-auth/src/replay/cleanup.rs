//! Periodic expiry sweep for the replay set.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use shopgate_core::config::ReplayConfig;
use shopgate_core::result::AppResult;
use shopgate_core::traits::ReplayStore;

/// Drops expired jti entries from the replay store's expiry index.
///
/// The store only rotates its filter once a whole generation of
/// recorded jtis has expired, so sweeping is safe to run at any time.
#[derive(Clone)]
pub struct ReplayCleanup {
    store: Arc<dyn ReplayStore>,
    interval: Duration,
}

impl std::fmt::Debug for ReplayCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayCleanup")
            .field("interval", &self.interval)
            .finish()
    }
}

impl ReplayCleanup {
    pub fn new(store: Arc<dyn ReplayStore>, config: &ReplayConfig) -> Self {
        Self {
            store,
            interval: Duration::from_secs(config.cleanup_interval_seconds.max(1)),
        }
    }

    /// Runs one sweep cycle. Returns the number of entries removed.
    pub async fn run_sweep(&self) -> AppResult<u64> {
        let removed = self.store.sweep_expired().await?;
        if removed > 0 {
            info!(removed, "Replay index sweep completed");
        }
        Ok(removed)
    }

    /// Spawns the background sweep loop.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_sweep().await {
                    error!(error = %e, "Replay index sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use shopgate_store::memory::MemoryReplayStore;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sweep_reports_removed_entries() {
        let config = ReplayConfig::default();
        let store = Arc::new(MemoryReplayStore::new(&config));
        store
            .record("jti-1", Duration::from_secs(10))
            .await
            .unwrap();
        store
            .record("jti-2", Duration::from_secs(10))
            .await
            .unwrap();

        let cleanup = ReplayCleanup::new(store, &config);
        assert_eq!(cleanup.run_sweep().await.unwrap(), 0);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cleanup.run_sweep().await.unwrap(), 2);
    }
}
