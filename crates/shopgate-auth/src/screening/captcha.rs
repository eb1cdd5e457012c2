//! CAPTCHA response verification.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use shopgate_core::error::{AppError, ErrorKind};
use shopgate_core::result::AppResult;
use shopgate_resilience::OperationGuard;

#[derive(Debug, Deserialize)]
struct CaptchaReply {
    success: bool,
    score: Option<f64>,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Client for a reCAPTCHA-style `siteverify` endpoint.
#[derive(Debug, Clone)]
pub struct CaptchaClient {
    http: reqwest::Client,
    url: String,
    secret: String,
    guard: Arc<OperationGuard>,
}

impl CaptchaClient {
    pub fn new(
        http: reqwest::Client,
        url: String,
        secret: String,
        guard: Arc<OperationGuard>,
    ) -> Self {
        Self {
            http,
            url,
            secret,
            guard,
        }
    }

    /// Verify a client-solved challenge token.
    pub async fn verify(&self, challenge_response: &str, remote_ip: Option<&str>) -> AppResult<bool> {
        self.guard
            .run(|| async {
                let mut form = vec![
                    ("secret", self.secret.as_str()),
                    ("response", challenge_response),
                ];
                if let Some(ip) = remote_ip {
                    form.push(("remoteip", ip));
                }

                let response = self.http.post(&self.url).form(&form).send().await.map_err(
                    |e| {
                        AppError::with_source(
                            ErrorKind::Dependency,
                            "CAPTCHA verification request failed",
                            e,
                        )
                    },
                )?;
                if !response.status().is_success() {
                    return Err(AppError::dependency(format!(
                        "CAPTCHA service returned {}",
                        response.status()
                    )));
                }
                let reply: CaptchaReply = response.json().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Dependency, "Malformed CAPTCHA reply", e)
                })?;

                if !reply.success {
                    debug!(errors = ?reply.error_codes, "CAPTCHA verification negative");
                }
                Ok(reply.success && reply.score.unwrap_or(1.0) >= 0.5)
            })
            .await
    }
}
