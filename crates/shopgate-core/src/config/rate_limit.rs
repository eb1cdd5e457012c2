//! Rate limiter configuration.

use serde::{Deserialize, Serialize};

use super::replay::StoreFailurePolicy;

/// A single named limiter definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterDef {
    /// Limiter name, used as part of the store key.
    pub name: String,
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Maximum events permitted within the trailing window.
    pub limit: u32,
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Named limiter definitions. The pipeline's global stage uses the
    /// limiter named `"global"`.
    #[serde(default = "default_limiters")]
    pub limiters: Vec<RateLimiterDef>,
    /// What to do when the rate-limit store is unreachable.
    #[serde(default = "default_on_store_error")]
    pub on_store_error: StoreFailurePolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limiters: default_limiters(),
            on_store_error: default_on_store_error(),
        }
    }
}

impl RateLimitConfig {
    /// Look up a limiter definition by name.
    pub fn limiter(&self, name: &str) -> Option<&RateLimiterDef> {
        self.limiters.iter().find(|l| l.name == name)
    }
}

fn default_limiters() -> Vec<RateLimiterDef> {
    vec![RateLimiterDef {
        name: "global".to_string(),
        window_ms: 60_000,
        limit: 300,
    }]
}

fn default_on_store_error() -> StoreFailurePolicy {
    StoreFailurePolicy::FailClosed
}
