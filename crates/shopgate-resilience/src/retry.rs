//! Retry policy: bounded attempts with configurable backoff.

use std::time::Duration;

use rand::RngExt;

use shopgate_core::config::{BackoffKind, OperationPolicyConfig};
use shopgate_core::error::{AppError, ErrorKind};

/// Decides whether and when a failed attempt is repeated.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    backoff: BackoffKind,
}

impl RetryPolicy {
    pub fn from_config(config: &OperationPolicyConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.backoff_base_ms),
            backoff: config.backoff,
        }
    }

    /// Maximum attempts, including the first call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether a failed attempt with this error is worth repeating.
    /// Client-side rejections (auth, validation) are not; transient
    /// dependency trouble is.
    pub fn is_retryable(&self, error: &AppError) -> bool {
        matches!(
            error.kind,
            ErrorKind::Dependency | ErrorKind::ServiceUnavailable | ErrorKind::Store
        )
    }

    /// Delay before the given attempt number (the first retry is
    /// attempt 2).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.base,
            BackoffKind::ExponentialJitter => {
                let exp = attempt.saturating_sub(2).min(16);
                let scaled = self.base.saturating_mul(1u32 << exp);
                let jitter_ceiling = (scaled.as_millis() as u64 / 2).max(1);
                let jitter = rand::rng().random_range(0..jitter_ceiling);
                scaled + Duration::from_millis(jitter)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(backoff: BackoffKind) -> RetryPolicy {
        let mut config = OperationPolicyConfig::named("test-op");
        config.max_attempts = 3;
        config.backoff_base_ms = 100;
        config.backoff = backoff;
        RetryPolicy::from_config(&config)
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let policy = policy(BackoffKind::Fixed);
        assert_eq!(policy.delay_before(2), Duration::from_millis(100));
        assert_eq!(policy.delay_before(3), Duration::from_millis(100));
    }

    #[test]
    fn exponential_backoff_grows() {
        let policy = policy(BackoffKind::ExponentialJitter);
        let second = policy.delay_before(2);
        let third = policy.delay_before(3);
        assert!(second >= Duration::from_millis(100));
        assert!(second < Duration::from_millis(151));
        assert!(third >= Duration::from_millis(200));
        assert!(third < Duration::from_millis(301));
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        let policy = policy(BackoffKind::Fixed);
        assert!(policy.is_retryable(&AppError::dependency("boom")));
        assert!(policy.is_retryable(&AppError::store("redis down")));
        assert!(!policy.is_retryable(&AppError::authentication("bad token")));
        assert!(!policy.is_retryable(&AppError::validation("bad input")));
    }
}
