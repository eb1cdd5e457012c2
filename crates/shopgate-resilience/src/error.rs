//! Errors produced by the resilience mechanisms themselves.

use std::time::Duration;

use shopgate_core::error::{AppError, ErrorKind};

/// A call was rejected or abandoned by a resilience mechanism before
/// (or instead of) a dependency-level failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResilienceError {
    /// The circuit breaker is open; the call was not attempted.
    #[error("circuit open for operation '{operation}'")]
    CircuitOpen { operation: String },

    /// No bulkhead slot became free within the configured wait.
    #[error("bulkhead saturated for operation '{operation}'")]
    BulkheadFull { operation: String },

    /// The call did not complete within the configured timeout.
    #[error("operation '{operation}' timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },
}

/// Fast-fail rejections (breaker, bulkhead) are the wrapper protecting
/// itself and map to ServiceUnavailable; a timeout is the dependency
/// actually misbehaving and maps to Dependency. The original error
/// rides along as the source.
impl From<ResilienceError> for AppError {
    fn from(err: ResilienceError) -> Self {
        let kind = match &err {
            ResilienceError::CircuitOpen { .. } | ResilienceError::BulkheadFull { .. } => {
                ErrorKind::ServiceUnavailable
            }
            ResilienceError::Timeout { .. } => ErrorKind::Dependency,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn fast_fail_and_timeout_keep_distinct_kinds() {
        let open = AppError::from(ResilienceError::CircuitOpen {
            operation: "geo".to_string(),
        });
        let full = AppError::from(ResilienceError::BulkheadFull {
            operation: "geo".to_string(),
        });
        let slow = AppError::from(ResilienceError::Timeout {
            operation: "geo".to_string(),
            timeout: Duration::from_millis(50),
        });

        assert_eq!(open.kind, ErrorKind::ServiceUnavailable);
        assert_eq!(full.kind, ErrorKind::ServiceUnavailable);
        assert_eq!(slow.kind, ErrorKind::Dependency);
        assert_ne!(open.kind, slow.kind);
    }

    #[test]
    fn conversion_keeps_the_original_as_source() {
        let err = AppError::from(ResilienceError::Timeout {
            operation: "geo".to_string(),
            timeout: Duration::from_millis(50),
        });
        let source = err.source().expect("source attached");
        assert!(source.to_string().contains("timed out"));
    }
}
