//! Route definitions.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::pipeline;
use crate::state::AppState;

/// Build the axum router with the security pipeline in front of every
/// route. Public routes are exempted inside the pipeline itself so the
/// global rate limit still covers them.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/api/profile", get(handlers::profile::get_profile))
        .route(
            "/api/screening/password",
            post(handlers::screening::check_password),
        )
        .route(
            "/api/screening/captcha",
            post(handlers::screening::verify_captcha),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            pipeline::security_pipeline,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
