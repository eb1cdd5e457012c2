//! Token verification configuration.

use serde::{Deserialize, Serialize};

/// Bearer token verification configuration.
///
/// Tokens are issued by an external identity provider; Shopgate only
/// verifies them. The verification key material is therefore public.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Signature algorithm: `"RS256"` (production) or `"HS256"` (development).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// PEM-encoded RSA public key of the token issuer (RS256 mode).
    #[serde(default)]
    pub public_key_pem: String,
    /// Shared HMAC secret (HS256 mode only).
    #[serde(default)]
    pub hmac_secret: String,
    /// Expected issuer claim; empty disables the check.
    #[serde(default)]
    pub issuer: String,
    /// Clock-skew leeway in seconds applied to expiry validation.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            public_key_pem: String::new(),
            hmac_secret: String::new(),
            issuer: String::new(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_algorithm() -> String {
    "RS256".to_string()
}

fn default_leeway() -> u64 {
    5
}
