//! Screening endpoints: pipeline coverage and input validation.
//!
//! The outbound breach and CAPTCHA services are not stubbed here, so
//! these tests only drive the paths that reject before any lookup.

use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::{TEST_USER_AGENT, TestApp, error_code, fingerprint_for, mint_token};

#[tokio::test]
async fn screening_routes_sit_behind_the_pipeline() {
    let app = TestApp::new();

    for path in ["/api/screening/password", "/api/screening/captcha"] {
        let (status, body, _) = app.post_json(path, None, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(error_code(&body), "AUTHENTICATION", "{path}");
    }
}

#[tokio::test]
async fn empty_password_is_rejected_before_any_lookup() {
    let app = TestApp::new();
    let token = mint_token(Uuid::new_v4(), &fingerprint_for(TEST_USER_AGENT));

    let (status, body, _) = app
        .post_json(
            "/api/screening/password",
            Some(&token),
            json!({ "password": "" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION");
}

#[tokio::test]
async fn empty_challenge_is_rejected_before_any_lookup() {
    let app = TestApp::new();
    let token = mint_token(Uuid::new_v4(), &fingerprint_for(TEST_USER_AGENT));

    let (status, body, _) = app
        .post_json(
            "/api/screening/captcha",
            Some(&token),
            json!({ "challenge_response": "" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION");
}
