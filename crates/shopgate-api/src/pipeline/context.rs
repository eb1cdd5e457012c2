//! Per-request security context.

use axum::http::HeaderMap;
use uuid::Uuid;

use shopgate_auth::device::{DeviceSignals, derive_fingerprint};
use shopgate_auth::token::Claims;

/// Everything the pipeline stages know about a request. Built once
/// from the request head; stages move it forward, filling fields as
/// they pass.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    /// Client network address (first `X-Forwarded-For` entry).
    pub address: String,
    /// Raw bearer token, if an Authorization header was sent.
    pub token: Option<String>,
    /// Fingerprint derived from the request's device signals.
    pub fingerprint: String,
    /// Claims, present once the authenticate stage has passed.
    pub claims: Option<Claims>,
    /// Subject parsed as a user id, set with `claims`.
    pub user_id: Option<Uuid>,
    /// Whether the device stage registered a new device record.
    pub device_newly_registered: bool,
}

impl SecurityContext {
    /// Build the initial context from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let address = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown")
            .to_string();

        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let signals = DeviceSignals {
            user_agent: header_str(headers, "user-agent"),
            screen: header_str(headers, "x-device-screen"),
            client_hints: header_str(headers, "sec-ch-ua"),
        };

        Self {
            address,
            token,
            fingerprint: derive_fingerprint(&signals),
            claims: None,
            user_id: None,
            device_newly_registered: false,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// The authenticated identity a fully passed pipeline leaves in the
/// request extensions for handlers to extract.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub subject: String,
    pub jti: Uuid,
    pub scope: Vec<String>,
    pub fingerprint: String,
    pub address: String,
    pub device_newly_registered: bool,
}
