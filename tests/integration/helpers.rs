//! Shared test helpers: a hermetic app over in-memory providers.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, Response, StatusCode};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use shopgate_api::AppState;
use shopgate_auth::device::{DeviceSignals, DeviceTrustStore, MemoryDeviceRepository, derive_fingerprint};
use shopgate_auth::replay::ReplayGuard;
use shopgate_auth::screening::{BreachPasswordClient, CaptchaClient};
use shopgate_auth::token::{Claims, TokenAuthenticator};
use shopgate_core::config::{
    AppConfig, DatabaseConfig, DeviceConfig, LoggingConfig, RateLimitConfig, ReplayConfig,
    ResilienceConfig, ScreeningConfig, ServerConfig, StoreConfig, TokenConfig,
};
use shopgate_core::traits::DeviceRepository;
use shopgate_resilience::ResilienceRegistry;
use shopgate_store::memory::{MemoryRateLimitStore, MemoryReplayStore};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_USER_AGENT: &str = "Mozilla/5.0 (integration tests)";

/// Test application wired like the binary, minus Postgres and Redis.
pub struct TestApp {
    pub router: Router,
    pub device_repo: Arc<MemoryDeviceRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Build an app after tweaking the default test configuration.
    pub fn with_config(mutate: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = test_config();
        mutate(&mut config);

        let device_repo = Arc::new(MemoryDeviceRepository::new());
        let authenticator =
            Arc::new(TokenAuthenticator::new(&config.token).expect("test token config"));
        let replay_store = Arc::new(MemoryReplayStore::new(&config.replay));
        let replay_guard = Arc::new(ReplayGuard::new(replay_store, config.replay.clone()));
        let device_trust = Arc::new(DeviceTrustStore::new(
            Arc::clone(&device_repo) as Arc<dyn DeviceRepository>,
            config.device.clone(),
            None,
        ));
        let rate_limit_store = Arc::new(MemoryRateLimitStore::new(&config.store.memory));

        // Screening clients are wired like the binary; tests only
        // exercise the paths that reject before any outbound call.
        let resilience = ResilienceRegistry::new(&config.resilience);
        let http = reqwest::Client::new();
        let breach = Arc::new(BreachPasswordClient::new(
            http.clone(),
            config.screening.breach_password_url.clone(),
            resilience.guard("breach_password"),
        ));
        let captcha = Arc::new(CaptchaClient::new(
            http,
            config.screening.captcha_url.clone(),
            config.screening.captcha_secret.clone(),
            resilience.guard("captcha"),
        ));

        let state = AppState {
            config: Arc::new(config),
            authenticator,
            replay_guard,
            device_trust,
            rate_limit_store,
            breach,
            captcha,
        };

        Self {
            router: shopgate_api::build_router(state),
            device_repo,
        }
    }

    /// GET a path with the default test user agent and optional token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value, Response<Body>) {
        self.get_as(path, token, TEST_USER_AGENT).await
    }

    /// POST a JSON body with the default test user agent and optional
    /// token.
    pub async fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value, Response<Body>) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("user-agent", TEST_USER_AGENT)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.dispatch(request).await
    }

    /// GET with an explicit user agent (distinct agents mean distinct
    /// device fingerprints).
    pub async fn get_as(
        &self,
        path: &str,
        token: Option<&str>,
        user_agent: &str,
    ) -> (StatusCode, Value, Response<Body>) {
        let mut builder = Request::builder()
            .uri(path)
            .header("user-agent", user_agent);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty()).unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value, Response<Body>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the tower level");

        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json, Response::from_parts(parts, Body::empty()))
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://unused-in-tests".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout_seconds: 1,
        },
        store: StoreConfig::default(),
        token: TokenConfig {
            algorithm: "HS256".to_string(),
            hmac_secret: TEST_SECRET.to_string(),
            ..TokenConfig::default()
        },
        replay: ReplayConfig::default(),
        device: DeviceConfig::default(),
        rate_limit: RateLimitConfig::default(),
        resilience: ResilienceConfig::default(),
        screening: ScreeningConfig::default(),
        logging: LoggingConfig::default(),
    }
}

/// Fingerprint the pipeline will derive for [`TEST_USER_AGENT`].
pub fn fingerprint_for(user_agent: &str) -> String {
    derive_fingerprint(&DeviceSignals {
        user_agent,
        screen: "",
        client_hints: "",
    })
}

/// Mint a valid token bound to the given user and fingerprint.
pub fn mint_token(user_id: Uuid, dfp: &str) -> String {
    mint_claims(claims(user_id, dfp), TEST_SECRET)
}

/// Claims for a fresh five-minute token.
pub fn claims(user_id: Uuid, dfp: &str) -> Claims {
    Claims {
        sub: user_id.to_string(),
        jti: Uuid::new_v4(),
        scope: vec!["orders:read".to_string()],
        dfp: dfp.to_string(),
        iss: None,
        iat: Utc::now().timestamp(),
        exp: Utc::now().timestamp() + 300,
    }
}

/// Sign claims with an arbitrary secret (wrong secrets make tampered
/// tokens).
pub fn mint_claims(claims: Claims, secret: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn error_code(body: &Value) -> &str {
    body.get("errorCode").and_then(Value::as_str).unwrap_or("")
}
