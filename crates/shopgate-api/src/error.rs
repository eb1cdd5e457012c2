//! Maps domain `AppError` to HTTP responses.

use std::time::Duration;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use shopgate_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    #[serde(rename = "errorCode")]
    pub error_code: String,
    /// Human-readable message.
    pub message: String,
}

fn status_for(kind: &ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Authentication | ErrorKind::ReplayDetected => StatusCode::UNAUTHORIZED,
        ErrorKind::DeviceForbidden => StatusCode::FORBIDDEN,
        ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Dependency | ErrorKind::Store | ErrorKind::ServiceUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// An HTTP-bound failure: the domain error plus response metadata the
/// plain error cannot carry (the rate limiter's Retry-After hint).
///
/// `AppError` lives in shopgate-core and axum's `IntoResponse` cannot
/// be implemented for it here, so every error leaves this crate through
/// a `Rejection`.
#[derive(Debug)]
pub struct Rejection {
    pub error: AppError,
    pub retry_after: Option<Duration>,
}

impl From<AppError> for Rejection {
    fn from(error: AppError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = status_for(&self.error.kind);

        // Server-side faults keep their detail in the logs, not the body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.error, "Internal server error");
            "Internal server error".to_string()
        } else {
            self.error.message.clone()
        };

        let body = ApiErrorResponse {
            error_code: self.error.kind.to_string(),
            message,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(retry_after) = self.retry_after {
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
