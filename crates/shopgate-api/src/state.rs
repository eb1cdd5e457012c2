//! Application state shared across handlers and middleware.

use std::sync::Arc;

use shopgate_auth::device::DeviceTrustStore;
use shopgate_auth::replay::ReplayGuard;
use shopgate_auth::screening::{BreachPasswordClient, CaptchaClient};
use shopgate_auth::token::TokenAuthenticator;
use shopgate_core::config::AppConfig;
use shopgate_core::traits::RateLimitStore;

/// Shared dependencies, passed to every handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Token signature/claim verification.
    pub authenticator: Arc<TokenAuthenticator>,
    /// Replay guard over the jti set.
    pub replay_guard: Arc<ReplayGuard>,
    /// Device fingerprint trust.
    pub device_trust: Arc<DeviceTrustStore>,
    /// Sliding-window rate limiter backend.
    pub rate_limit_store: Arc<dyn RateLimitStore>,
    /// Breach-password screening client.
    pub breach: Arc<BreachPasswordClient>,
    /// CAPTCHA verification client.
    pub captcha: Arc<CaptchaClient>,
}
