//! Circuit breaker with a count-based sliding outcome window.
//!
//! The breaker tracks the last N call outcomes. Once the window is
//! full and the failure rate reaches the configured threshold, the
//! breaker opens and rejects calls without touching the dependency.
//! After a cooldown it admits probe calls (half-open); a run of
//! consecutive probe successes closes it again, a single probe
//! failure reopens it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use shopgate_core::config::OperationPolicyConfig;

use crate::error::ResilienceError;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Calls are rejected immediately.
    Open,
    /// Probe calls are admitted to test recovery.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// Last N outcomes, `true` = success. Only consulted while closed.
    outcomes: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_successes: u32,
}

/// Circuit breaker for a single named operation.
#[derive(Debug)]
pub struct CircuitBreaker {
    operation: String,
    failure_rate_threshold: u8,
    window_size: usize,
    open_cooldown: Duration,
    trial_successes: u32,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn from_config(config: &OperationPolicyConfig) -> Self {
        Self {
            operation: config.name.clone(),
            failure_rate_threshold: config.failure_rate_threshold,
            window_size: config.sliding_window_size.max(1) as usize,
            open_cooldown: Duration::from_millis(config.open_cooldown_ms),
            trial_successes: config.half_open_trial_successes.max(1),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                outcomes: VecDeque::new(),
                opened_at: None,
                half_open_successes: 0,
            }),
        }
    }

    /// Gate a call. `Ok` means the call may proceed; an open breaker
    /// past its cooldown flips to half-open and admits the probe.
    pub fn try_acquire(&self) -> Result<(), ResilienceError> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.open_cooldown {
                    info!(operation = %self.operation, "Circuit breaker half-open, probing");
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                    Ok(())
                } else {
                    debug!(
                        operation = %self.operation,
                        remaining_ms = (self.open_cooldown - elapsed).as_millis() as u64,
                        "Circuit breaker open, rejecting call"
                    );
                    Err(ResilienceError::CircuitOpen {
                        operation: self.operation.clone(),
                    })
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => self.push_outcome(&mut inner, true),
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.trial_successes {
                    info!(
                        operation = %self.operation,
                        probes = inner.half_open_successes,
                        "Circuit breaker closing after successful probes"
                    );
                    inner.state = CircuitState::Closed;
                    inner.outcomes.clear();
                    inner.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                self.push_outcome(&mut inner, false);
                if inner.outcomes.len() >= self.window_size {
                    let failures = inner.outcomes.iter().filter(|ok| !**ok).count();
                    let rate = failures * 100 / inner.outcomes.len();
                    if rate >= self.failure_rate_threshold as usize {
                        warn!(
                            operation = %self.operation,
                            failure_rate = rate,
                            threshold = self.failure_rate_threshold,
                            "Circuit breaker opening"
                        );
                        inner.state = CircuitState::Open;
                        inner.opened_at = Some(Instant::now());
                        inner.outcomes.clear();
                    }
                }
            }
            CircuitState::HalfOpen => {
                warn!(operation = %self.operation, "Circuit breaker reopening after probe failure");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    fn push_outcome(&self, inner: &mut Inner, success: bool) {
        if inner.outcomes.len() == self.window_size {
            inner.outcomes.pop_front();
        }
        inner.outcomes.push_back(success);
    }
}
