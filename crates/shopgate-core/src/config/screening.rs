//! Screening service endpoint configuration.

use serde::{Deserialize, Serialize};

/// Endpoints for the external screening dependencies.
///
/// All calls to these endpoints go through the resilience wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Geolocation lookup base URL.
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,
    /// Breach-password range-query base URL (k-anonymity API).
    #[serde(default = "default_breach_url")]
    pub breach_password_url: String,
    /// CAPTCHA verification endpoint.
    #[serde(default = "default_captcha_url")]
    pub captcha_url: String,
    /// CAPTCHA shared secret.
    #[serde(default)]
    pub captcha_secret: String,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            geolocation_url: default_geolocation_url(),
            breach_password_url: default_breach_url(),
            captcha_url: default_captcha_url(),
            captcha_secret: String::new(),
        }
    }
}

fn default_geolocation_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_breach_url() -> String {
    "https://api.pwnedpasswords.com/range".to_string()
}

fn default_captcha_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}
