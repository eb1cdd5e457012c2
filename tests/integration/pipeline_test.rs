//! Full-pipeline behavior: ordering, short-circuits and pass-through.

use std::time::Duration;

use http::StatusCode;
use uuid::Uuid;

use shopgate_core::traits::DeviceRepository;

use crate::helpers::{
    TEST_SECRET, TEST_USER_AGENT, TestApp, claims, error_code, fingerprint_for, mint_claims,
    mint_token,
};

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn valid_token_reaches_protected_handler() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let token = mint_token(user, &fingerprint_for(TEST_USER_AGENT));

    let (status, body, _) = app.get("/api/profile", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user.to_string());
    assert_eq!(body["deviceNewlyRegistered"], true);
    assert_eq!(app.device_repo.count_active_by_user(user).await.unwrap(), 1);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body, _) = app.get("/api/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "AUTHENTICATION");
}

#[tokio::test]
async fn tampered_token_is_unauthorized_without_detail() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let token = mint_claims(
        claims(user, &fingerprint_for(TEST_USER_AGENT)),
        "some-other-secret",
    );

    let (status, body, _) = app.get("/api/profile", Some(&token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "AUTHENTICATION");
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn non_uuid_subject_is_unauthorized() {
    let app = TestApp::new();
    let mut c = claims(Uuid::new_v4(), &fingerprint_for(TEST_USER_AGENT));
    c.sub = "alice".to_string();
    let token = mint_claims(c, TEST_SECRET);

    let (status, body, _) = app.get("/api/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "AUTHENTICATION");
}

#[tokio::test]
async fn replayed_token_is_rejected_before_the_device_stage() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let fingerprint = fingerprint_for(TEST_USER_AGENT);
    let token = mint_token(user, &fingerprint);

    let (status, _, _) = app.get("/api/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = app.get("/api/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "REPLAY_DETECTED");

    // The device stage never ran for the replayed request: the record
    // from the first request is untouched.
    let record = app
        .device_repo
        .find_by_user_and_fingerprint(user, &fingerprint)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.failed_attempts, 0);
    assert_eq!(app.device_repo.count_active_by_user(user).await.unwrap(), 1);
}

#[tokio::test]
async fn fresh_tokens_from_the_same_device_keep_working() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let fingerprint = fingerprint_for(TEST_USER_AGENT);

    for _ in 0..3 {
        let token = mint_token(user, &fingerprint);
        let (status, _, _) = app.get("/api/profile", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
    }
    // Same device throughout, one record.
    assert_eq!(app.device_repo.count_active_by_user(user).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_device_is_blocked_when_soft_allow_is_off() {
    let app = TestApp::with_config(|config| {
        config.device.allow_unknown_devices = false;
    });
    let token = mint_token(Uuid::new_v4(), &fingerprint_for(TEST_USER_AGENT));

    let (status, body, _) = app.get("/api/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "DEVICE_FORBIDDEN");
}

#[tokio::test]
async fn fingerprint_must_match_token_binding() {
    let app = TestApp::new();
    let token = mint_token(Uuid::new_v4(), "fingerprint-of-someone-else");

    let (status, body, _) = app.get("/api/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "DEVICE_FORBIDDEN");
}

#[tokio::test]
async fn device_quota_blocks_the_extra_device_and_leaves_others_active() {
    let app = TestApp::with_config(|config| {
        config.device.max_devices_per_user = 2;
    });
    let user = Uuid::new_v4();

    for agent in ["agent-one", "agent-two"] {
        let token = mint_token(user, &fingerprint_for(agent));
        let (status, _, _) = app.get_as("/api/profile", Some(&token), agent).await;
        assert_eq!(status, StatusCode::OK);
    }

    let token = mint_token(user, &fingerprint_for("agent-three"));
    let (status, body, _) = app.get_as("/api/profile", Some(&token), "agent-three").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "DEVICE_FORBIDDEN");
    assert_eq!(app.device_repo.count_active_by_user(user).await.unwrap(), 2);
}

#[tokio::test]
async fn rate_limit_applies_before_everything_and_recovers() {
    let app = TestApp::with_config(|config| {
        config.rate_limit.limiters[0].window_ms = 300;
        config.rate_limit.limiters[0].limit = 2;
    });

    // Even the public route counts against the global limiter.
    for _ in 0..2 {
        let (status, _, _) = app.get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body, response) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_code(&body), "RATE_LIMIT");
    assert!(response.headers().contains_key("retry-after"));

    // A trailing window slides; after it passes, requests are admitted
    // again.
    tokio::time::sleep(Duration::from_millis(350)).await;
    let (status, _, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limited_request_never_reaches_authentication() {
    let app = TestApp::with_config(|config| {
        config.rate_limit.limiters[0].window_ms = 60_000;
        config.rate_limit.limiters[0].limit = 1;
    });
    let user = Uuid::new_v4();
    let fingerprint = fingerprint_for(TEST_USER_AGENT);

    let first = mint_token(user, &fingerprint);
    let (status, _, _) = app.get("/api/profile", Some(&first)).await;
    assert_eq!(status, StatusCode::OK);

    // A garbage token behind the limiter gets 429, not 401: stage one
    // rejected before authentication ran.
    let (status, body, _) = app.get("/api/profile", Some("garbage")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error_code(&body), "RATE_LIMIT");
}
