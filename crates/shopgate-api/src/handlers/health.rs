//! Health check endpoints (no auth required).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe: verifies the security stores are reachable.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let replay_ok = state
        .replay_guard
        .store()
        .health_check()
        .await
        .unwrap_or(false);
    let rate_limit_ok = state
        .rate_limit_store
        .health_check()
        .await
        .unwrap_or(false);

    let status = if replay_ok && rate_limit_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ready" } else { "degraded" },
            "replayStore": replay_ok,
            "rateLimitStore": rate_limit_ok,
        })),
    )
}
