//! Token signature and claim validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use shopgate_core::config::TokenConfig;
use shopgate_core::error::AppError;
use shopgate_core::result::AppResult;

use super::claims::Claims;

/// Verifies bearer tokens against the issuer's key material.
///
/// Validation is side-effect free; replay and device checks happen in
/// later pipeline stages. Every rejection surfaces as the same
/// `Authentication` error so callers cannot distinguish a bad
/// signature from an expired token; the precise cause goes to logs.
#[derive(Clone)]
pub struct TokenAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenAuthenticator {
    pub fn new(config: &TokenConfig) -> AppResult<Self> {
        let (algorithm, decoding_key) = match config.algorithm.as_str() {
            "RS256" => {
                let key = DecodingKey::from_rsa_pem(config.public_key_pem.as_bytes())
                    .map_err(|e| {
                        AppError::with_source(
                            shopgate_core::error::ErrorKind::Configuration,
                            "Invalid token public key PEM",
                            e,
                        )
                    })?;
                (Algorithm::RS256, key)
            }
            "HS256" => {
                if config.hmac_secret.is_empty() {
                    return Err(AppError::configuration(
                        "HS256 selected but no HMAC secret configured",
                    ));
                }
                (
                    Algorithm::HS256,
                    DecodingKey::from_secret(config.hmac_secret.as_bytes()),
                )
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unsupported token algorithm: {other}"
                )));
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
            issuer: (!config.issuer.is_empty()).then(|| config.issuer.clone()),
        })
    }

    /// Decode and validate a token string into typed claims.
    pub fn validate(&self, token: &str) -> AppResult<Claims> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!(cause = %e, "Token rejected");
                AppError::authentication("Invalid or expired token")
            })?;

        let claims = token_data.claims;
        if claims.sub.trim().is_empty() {
            debug!("Token rejected: blank subject");
            return Err(AppError::authentication("Invalid or expired token"));
        }

        // Issuer is checked here, not via the decoder: a token with no
        // iss claim must also fail when an issuer is configured.
        if let Some(expected) = &self.issuer
            && claims.iss.as_deref() != Some(expected.as_str())
        {
            debug!(iss = ?claims.iss, "Token rejected: issuer mismatch");
            return Err(AppError::authentication("Invalid or expired token"));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    use shopgate_core::error::ErrorKind;

    use super::*;

    const SECRET: &str = "test-secret-key-for-unit-tests";

    fn hs256_config() -> TokenConfig {
        TokenConfig {
            algorithm: "HS256".to_string(),
            hmac_secret: SECRET.to_string(),
            ..TokenConfig::default()
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            jti: Uuid::new_v4(),
            scope: vec!["orders:read".to_string()],
            dfp: "abc123".to_string(),
            iss: None,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 300,
        }
    }

    #[test]
    fn valid_token_round_trips() {
        let auth = TokenAuthenticator::new(&hs256_config()).unwrap();
        let claims = valid_claims();
        let decoded = auth.validate(&sign(&claims, SECRET)).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.scope, claims.scope);
        assert_eq!(decoded.dfp, claims.dfp);
    }

    #[test]
    fn tampered_signature_is_uniform_authentication_error() {
        let auth = TokenAuthenticator::new(&hs256_config()).unwrap();
        let err = auth
            .validate(&sign(&valid_claims(), "some-other-secret"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "Invalid or expired token");
    }

    #[test]
    fn expired_token_is_uniform_authentication_error() {
        let auth = TokenAuthenticator::new(&hs256_config()).unwrap();
        let mut claims = valid_claims();
        claims.iat = Utc::now().timestamp() - 600;
        claims.exp = Utc::now().timestamp() - 300;
        let err = auth.validate(&sign(&claims, SECRET)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "Invalid or expired token");
    }

    #[test]
    fn blank_subject_is_rejected_despite_valid_signature() {
        let auth = TokenAuthenticator::new(&hs256_config()).unwrap();
        let mut claims = valid_claims();
        claims.sub = "   ".to_string();
        let err = auth.validate(&sign(&claims, SECRET)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn garbage_input_is_rejected() {
        let auth = TokenAuthenticator::new(&hs256_config()).unwrap();
        assert!(auth.validate("not.a.token").is_err());
        assert!(auth.validate("").is_err());
    }

    #[test]
    fn missing_issuer_is_rejected_when_configured() {
        let mut config = hs256_config();
        config.issuer = "https://id.example.com".to_string();
        let auth = TokenAuthenticator::new(&config).unwrap();
        // Token carries no iss claim at all.
        let err = auth.validate(&sign(&valid_claims(), SECRET)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[test]
    fn wrong_issuer_is_rejected_when_configured() {
        let mut config = hs256_config();
        config.issuer = "https://id.example.com".to_string();
        let auth = TokenAuthenticator::new(&config).unwrap();
        let mut claims = valid_claims();
        claims.iss = Some("https://rogue.example.com".to_string());
        let err = auth.validate(&sign(&claims, SECRET)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "Invalid or expired token");
    }

    #[test]
    fn matching_issuer_is_accepted() {
        let mut config = hs256_config();
        config.issuer = "https://id.example.com".to_string();
        let auth = TokenAuthenticator::new(&config).unwrap();
        let mut claims = valid_claims();
        claims.iss = Some("https://id.example.com".to_string());
        assert!(auth.validate(&sign(&claims, SECRET)).is_ok());
    }

    #[test]
    fn misconfigured_algorithm_fails_construction() {
        let mut config = hs256_config();
        config.algorithm = "ES512".to_string();
        let err = TokenAuthenticator::new(&config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
