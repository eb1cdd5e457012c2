//! Resilience policy configuration for outbound dependencies.

use serde::{Deserialize, Serialize};

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Same delay between every attempt.
    Fixed,
    /// Delay doubles per attempt, with random jitter.
    ExponentialJitter,
}

/// Per-operation resilience policy.
///
/// Each named outbound operation (geolocation, breach check, CAPTCHA)
/// gets its own independent instances of the four mechanisms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationPolicyConfig {
    /// Logical operation name.
    pub name: String,
    /// Maximum concurrent in-flight calls (bulkhead).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
    /// Maximum wait for a bulkhead slot, in milliseconds.
    #[serde(default = "default_max_wait")]
    pub max_wait_ms: u64,
    /// Failure-rate threshold (percent) that opens the breaker.
    #[serde(default = "default_failure_rate")]
    pub failure_rate_threshold: u8,
    /// Number of recent call outcomes considered for the failure rate.
    #[serde(default = "default_window")]
    pub sliding_window_size: u32,
    /// How long the breaker stays open before probing, in milliseconds.
    #[serde(default = "default_open_cooldown")]
    pub open_cooldown_ms: u64,
    /// Consecutive trial successes required to close a half-open breaker.
    #[serde(default = "default_trial_successes")]
    pub half_open_trial_successes: u32,
    /// Maximum attempts including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between attempts, in milliseconds.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    /// Backoff strategy.
    #[serde(default = "default_backoff")]
    pub backoff: BackoffKind,
    /// Whether an empty/absent result counts as a retryable failure.
    #[serde(default)]
    pub retry_on_empty: bool,
    /// Overall call timeout, in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Resilience configuration: one policy per named operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Per-operation policies.
    #[serde(default = "default_operations")]
    pub operations: Vec<OperationPolicyConfig>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            operations: default_operations(),
        }
    }
}

impl OperationPolicyConfig {
    /// A policy with defaults for the given operation name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_concurrent: default_max_concurrent(),
            max_wait_ms: default_max_wait(),
            failure_rate_threshold: default_failure_rate(),
            sliding_window_size: default_window(),
            open_cooldown_ms: default_open_cooldown(),
            half_open_trial_successes: default_trial_successes(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            backoff: default_backoff(),
            retry_on_empty: false,
            timeout_ms: default_timeout(),
        }
    }
}

fn default_operations() -> Vec<OperationPolicyConfig> {
    vec![
        OperationPolicyConfig::named("geolocation"),
        OperationPolicyConfig::named("breach_password"),
        OperationPolicyConfig::named("captcha"),
    ]
}

fn default_max_concurrent() -> u32 {
    10
}

fn default_max_wait() -> u64 {
    100
}

fn default_failure_rate() -> u8 {
    50
}

fn default_window() -> u32 {
    10
}

fn default_open_cooldown() -> u64 {
    30_000
}

fn default_trial_successes() -> u32 {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    100
}

fn default_backoff() -> BackoffKind {
    BackoffKind::ExponentialJitter
}

fn default_timeout() -> u64 {
    2_000
}
