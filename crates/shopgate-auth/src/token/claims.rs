//! Typed claims carried by every access token.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims payload of an access token.
///
/// Shopgate does not issue these tokens; the identity provider does.
/// Every claim the pipeline relies on is a named, typed field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id as issued by the identity provider.
    pub sub: String,
    /// Token id, unique per issued token. The replay guard keys on it.
    pub jti: Uuid,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Vec<String>,
    /// Device fingerprint the token was issued to (hex SHA-256).
    #[serde(default)]
    pub dfp: String,
    /// Issuer, if the identity provider sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// The subject parsed as a user id, if it is one.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(self.sub.trim()).ok()
    }

    /// Whether the token grants the given scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }

    /// Remaining validity from now, zero if already expired.
    pub fn remaining_validity(&self) -> Duration {
        let remaining = self.exp - Utc::now().timestamp();
        Duration::from_secs(remaining.max(0) as u64)
    }
}
