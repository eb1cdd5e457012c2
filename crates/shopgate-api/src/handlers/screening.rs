//! Screening endpoints for checkout and signup flows.
//!
//! Thin JSON fronts over the outbound screening clients, so browser
//! code never talks to the third-party services directly and every
//! call rides the clients' resilience guards.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use shopgate_core::error::AppError;

use crate::error::Rejection;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PasswordCheckRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordCheckResponse {
    pub breached: bool,
    /// Breach occurrence count, present only when breached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Check a candidate password against known breach corpora. Only a
/// hash prefix leaves the process; see the breach client for the
/// k-anonymity scheme.
pub async fn check_password(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<PasswordCheckRequest>,
) -> Result<Json<PasswordCheckResponse>, Rejection> {
    if body.password.is_empty() {
        return Err(AppError::validation("Password must not be empty").into());
    }

    let count = state.breach.check(&body.password).await?;
    Ok(Json(PasswordCheckResponse {
        breached: count.is_some(),
        count,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CaptchaVerifyRequest {
    pub challenge_response: String,
}

#[derive(Debug, Serialize)]
pub struct CaptchaVerifyResponse {
    pub valid: bool,
}

/// Verify a client-solved CAPTCHA challenge.
pub async fn verify_captcha(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CaptchaVerifyRequest>,
) -> Result<Json<CaptchaVerifyResponse>, Rejection> {
    if body.challenge_response.is_empty() {
        return Err(AppError::validation("Challenge response must not be empty").into());
    }

    let remote_ip = (user.address != "unknown").then_some(user.address.as_str());
    let valid = state
        .captcha
        .verify(&body.challenge_response, remote_ip)
        .await?;
    Ok(Json(CaptchaVerifyResponse { valid }))
}
