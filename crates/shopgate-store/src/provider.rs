//! Store manager that dispatches to the configured provider.

use std::sync::Arc;

use tracing::info;

use shopgate_core::config::{ReplayConfig, StoreConfig};
use shopgate_core::error::AppError;
use shopgate_core::result::AppResult;
use shopgate_core::traits::{RateLimitStore, ReplayStore};

/// Store manager holding the configured replay and rate-limit backends.
///
/// The provider is selected at construction time based on configuration;
/// guards only ever see the trait objects.
#[derive(Debug, Clone)]
pub struct StoreManager {
    replay: Arc<dyn ReplayStore>,
    rate_limit: Arc<dyn RateLimitStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig, replay_config: &ReplayConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis store provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Ok(Self {
                    replay: Arc::new(crate::redis::RedisReplayStore::new(
                        client.clone(),
                        replay_config,
                    )),
                    rate_limit: Arc::new(crate::redis::RedisRateLimitStore::new(client)),
                })
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory store provider");
                Ok(Self {
                    replay: Arc::new(crate::memory::MemoryReplayStore::new(replay_config)),
                    rate_limit: Arc::new(crate::memory::MemoryRateLimitStore::new(&config.memory)),
                })
            }
            other => Err(AppError::configuration(format!(
                "Unknown store provider: '{other}'. Supported: memory, redis"
            ))),
        }
    }

    /// Create a store manager from existing providers (for testing).
    pub fn from_providers(
        replay: Arc<dyn ReplayStore>,
        rate_limit: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self { replay, rate_limit }
    }

    /// The replay store backend.
    pub fn replay(&self) -> Arc<dyn ReplayStore> {
        Arc::clone(&self.replay)
    }

    /// The rate-limit store backend.
    pub fn rate_limit(&self) -> Arc<dyn RateLimitStore> {
        Arc::clone(&self.rate_limit)
    }
}
