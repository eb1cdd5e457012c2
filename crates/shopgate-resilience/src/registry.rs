//! Guard composition and per-operation lookup.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use shopgate_core::config::{OperationPolicyConfig, ResilienceConfig};
use shopgate_core::error::AppError;
use shopgate_core::result::AppResult;

use crate::breaker::CircuitBreaker;
use crate::bulkhead::Bulkhead;
use crate::error::ResilienceError;
use crate::retry::RetryPolicy;

/// All four resilience mechanisms for one named operation.
///
/// Per attempt: breaker gate, then bulkhead slot, then the call under
/// a timeout. Failed attempts feed the breaker and may be retried
/// with backoff; breaker and bulkhead rejections are terminal for the
/// whole call.
#[derive(Debug)]
pub struct OperationGuard {
    operation: String,
    breaker: CircuitBreaker,
    bulkhead: Bulkhead,
    retry: RetryPolicy,
    timeout: Duration,
    retry_on_empty: bool,
}

impl OperationGuard {
    pub fn from_config(config: &OperationPolicyConfig) -> Self {
        Self {
            operation: config.name.clone(),
            breaker: CircuitBreaker::from_config(config),
            bulkhead: Bulkhead::from_config(config),
            retry: RetryPolicy::from_config(config),
            timeout: Duration::from_millis(config.timeout_ms),
            retry_on_empty: config.retry_on_empty,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run a call under this guard.
    pub async fn run<T, F, Fut>(&self, op: F) -> AppResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.execute(op, |_| false).await
    }

    /// Run a call whose empty result may itself be retried, when the
    /// operation is configured that way. An empty result after the
    /// last attempt is returned as-is.
    pub async fn run_optional<T, F, Fut>(&self, op: F) -> AppResult<Option<T>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<Option<T>>>,
    {
        let retry_on_empty = self.retry_on_empty;
        self.execute(op, move |value| retry_on_empty && value.is_none())
            .await
    }

    async fn execute<T, F, Fut, P>(&self, op: F, wants_retry: P) -> AppResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<T>>,
        P: Fn(&T) -> bool,
    {
        let mut attempt = 1u32;
        loop {
            self.breaker.try_acquire().map_err(AppError::from)?;
            let permit = self.bulkhead.acquire().await.map_err(AppError::from)?;

            let outcome = tokio::time::timeout(self.timeout, op()).await;
            drop(permit);

            let error = match outcome {
                Ok(Ok(value)) => {
                    self.breaker.record_success();
                    if wants_retry(&value) && attempt < self.retry.max_attempts() {
                        warn!(
                            operation = %self.operation,
                            attempt,
                            "Empty result, retrying"
                        );
                        attempt += 1;
                        tokio::time::sleep(self.retry.delay_before(attempt)).await;
                        continue;
                    }
                    return Ok(value);
                }
                Ok(Err(err)) => {
                    self.breaker.record_failure();
                    err
                }
                Err(_) => {
                    self.breaker.record_failure();
                    AppError::from(ResilienceError::Timeout {
                        operation: self.operation.clone(),
                        timeout: self.timeout,
                    })
                }
            };

            if attempt < self.retry.max_attempts() && self.retry.is_retryable(&error) {
                warn!(
                    operation = %self.operation,
                    attempt,
                    error = %error,
                    "Attempt failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(self.retry.delay_before(attempt)).await;
                continue;
            }
            return Err(error);
        }
    }
}

/// Named guard lookup, built once from configuration.
#[derive(Debug, Clone)]
pub struct ResilienceRegistry {
    guards: HashMap<String, Arc<OperationGuard>>,
    /// Default-policy guards handed out for unconfigured names, kept so
    /// repeated lookups share one breaker/bulkhead.
    fallbacks: Arc<Mutex<HashMap<String, Arc<OperationGuard>>>>,
}

impl ResilienceRegistry {
    pub fn new(config: &ResilienceConfig) -> Self {
        let guards = config
            .operations
            .iter()
            .map(|op| (op.name.clone(), Arc::new(OperationGuard::from_config(op))))
            .collect();
        Self {
            guards,
            fallbacks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The guard for a named operation. Unknown names fall back to a
    /// default policy so a missing config entry degrades gracefully.
    pub fn guard(&self, operation: &str) -> Arc<OperationGuard> {
        match self.guards.get(operation) {
            Some(guard) => Arc::clone(guard),
            None => {
                let mut fallbacks = self.fallbacks.lock();
                let guard = fallbacks.entry(operation.to_string()).or_insert_with(|| {
                    warn!(operation, "No resilience policy configured, using defaults");
                    Arc::new(OperationGuard::from_config(&OperationPolicyConfig::named(
                        operation,
                    )))
                });
                Arc::clone(guard)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::breaker::CircuitState;
    use shopgate_core::config::BackoffKind;
    use shopgate_core::error::ErrorKind;

    fn fast_config(name: &str) -> OperationPolicyConfig {
        let mut config = OperationPolicyConfig::named(name);
        config.max_attempts = 3;
        config.backoff = BackoffKind::Fixed;
        config.backoff_base_ms = 10;
        config.timeout_ms = 50;
        config.sliding_window_size = 4;
        config.failure_rate_threshold = 50;
        config
    }

    #[tokio::test]
    async fn returns_first_success() {
        let guard = OperationGuard::from_config(&fast_config("op"));
        let calls = AtomicU32::new(0);

        let result: AppResult<u32> = guard
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_then_succeeds() {
        let guard = OperationGuard::from_config(&fast_config("op"));
        let calls = AtomicU32::new(0);

        let result: AppResult<&str> = guard
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::dependency("flaky"))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_non_transient_errors() {
        let guard = OperationGuard::from_config(&fast_config("op"));
        let calls = AtomicU32::new(0);

        let result: AppResult<()> = guard
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::validation("bad input"))
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let guard = OperationGuard::from_config(&fast_config("op"));
        let calls = AtomicU32::new(0);

        let result: AppResult<()> = guard
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::dependency("down"))
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Dependency);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_are_timed_out_and_counted_as_failures() {
        let guard = OperationGuard::from_config(&fast_config("op"));

        let result: AppResult<()> = guard
            .run(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Dependency);
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_short_circuits_calls() {
        let guard = OperationGuard::from_config(&fast_config("op"));
        let calls = AtomicU32::new(0);

        // Two guarded calls of three attempts each fill the outcome
        // window with failures and open the breaker.
        for _ in 0..2 {
            let _: AppResult<()> = guard
                .run(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::dependency("down"))
                })
                .await;
        }
        assert_eq!(guard.breaker().state(), CircuitState::Open);
        let before = calls.load(Ordering::SeqCst);

        let result: AppResult<()> = guard
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::dependency("down"))
            })
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::ServiceUnavailable);
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_results_are_retried_when_configured() {
        let mut config = fast_config("op");
        config.retry_on_empty = true;
        let guard = OperationGuard::from_config(&config);
        let calls = AtomicU32::new(0);

        let result: AppResult<Option<u32>> = guard
            .run_optional(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 { Ok(None) } else { Ok(Some(42)) }
            })
            .await;

        assert_eq!(result.unwrap(), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_results_pass_through_by_default() {
        let guard = OperationGuard::from_config(&fast_config("op"));
        let calls = AtomicU32::new(0);

        let result: AppResult<Option<u32>> = guard
            .run_optional(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await;

        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_resolves_configured_operations() {
        let registry = ResilienceRegistry::new(&ResilienceConfig::default());
        let guard = registry.guard("geolocation");
        assert_eq!(guard.breaker().state(), CircuitState::Closed);
        // Unknown names get a default guard rather than a panic.
        let _fallback = registry.guard("unheard-of");
    }

    #[test]
    fn fallback_guards_are_shared_across_lookups() {
        let registry = ResilienceRegistry::new(&ResilienceConfig::default());
        let first = registry.guard("unheard-of");
        let second = registry.guard("unheard-of");
        // Same instance, so breaker and bulkhead state accumulates.
        assert!(Arc::ptr_eq(&first, &second));
    }
}
