//! Compromised-password screening via a k-anonymity range query.
//!
//! Only the first five hex digits of the password's SHA-1 digest ever
//! leave the process; the service returns all suffixes in that range
//! and the match happens locally.

use std::sync::Arc;

use sha1::{Digest, Sha1};

use shopgate_core::error::{AppError, ErrorKind};
use shopgate_core::result::AppResult;
use shopgate_resilience::OperationGuard;

const PREFIX_LEN: usize = 5;

/// Client for a pwned-passwords style range endpoint.
#[derive(Debug, Clone)]
pub struct BreachPasswordClient {
    http: reqwest::Client,
    base_url: String,
    guard: Arc<OperationGuard>,
}

impl BreachPasswordClient {
    pub fn new(http: reqwest::Client, base_url: String, guard: Arc<OperationGuard>) -> Self {
        Self {
            http,
            base_url,
            guard,
        }
    }

    /// How many times the password appears in known breaches; `None`
    /// when it does not appear at all.
    pub async fn check(&self, password: &str) -> AppResult<Option<u64>> {
        let (prefix, suffix) = hash_range_parts(password);
        self.guard
            .run(|| async {
                let url = format!("{}/{}", self.base_url.trim_end_matches('/'), prefix);
                let response = self.http.get(&url).send().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Dependency, "Breach range request failed", e)
                })?;
                if !response.status().is_success() {
                    return Err(AppError::dependency(format!(
                        "Breach service returned {}",
                        response.status()
                    )));
                }
                let body = response.text().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Dependency, "Malformed breach reply", e)
                })?;
                Ok(find_suffix(&body, &suffix))
            })
            .await
    }
}

/// Split a password's SHA-1 digest into the transmitted prefix and the
/// locally matched suffix, both uppercase hex.
fn hash_range_parts(password: &str) -> (String, String) {
    let digest = Sha1::digest(password.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest {
        hex.push_str(&format!("{b:02X}"));
    }
    let suffix = hex.split_off(PREFIX_LEN);
    (hex, suffix)
}

/// Scan a `SUFFIX:COUNT` range body for the given suffix.
fn find_suffix(body: &str, suffix: &str) -> Option<u64> {
    body.lines().find_map(|line| {
        let (candidate, count) = line.trim().split_once(':')?;
        if candidate.eq_ignore_ascii_case(suffix) {
            count.trim().parse().ok()
        } else {
            None
        }
    })
}
