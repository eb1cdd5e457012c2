//! Pipeline middleware: runs the stages in order and injects the
//! authenticated context on full pass.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

use super::context::{AuthContext, SecurityContext};
use super::stages::{
    StageOutcome, authenticate_stage, device_stage, rate_limit_stage, replay_stage,
};

/// Routes that skip the token, replay and device stages. The global
/// rate limit still applies to them.
fn is_public(path: &str) -> bool {
    matches!(path, "/health" | "/health/ready")
}

/// The security pipeline as an axum middleware.
///
/// Stage order is fixed: rate limit → authenticate → replay → device.
/// The first rejection wins; nothing downstream of it runs.
pub async fn security_pipeline(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = SecurityContext::from_headers(request.headers());

    let ctx = match rate_limit_stage(&state, ctx).await {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Reject(rejection) => return rejection.into_response(),
    };

    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let ctx = match authenticate_stage(&state, ctx).await {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Reject(rejection) => return rejection.into_response(),
    };

    let ctx = match replay_stage(&state, ctx).await {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Reject(rejection) => return rejection.into_response(),
    };

    let ctx = match device_stage(&state, ctx).await {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Reject(rejection) => return rejection.into_response(),
    };

    match auth_context(ctx) {
        Some(auth) => {
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        // Cannot happen after a full pass; fail safe rather than leak through.
        None => crate::error::Rejection::from(shopgate_core::error::AppError::internal(
            "Pipeline produced no identity",
        ))
        .into_response(),
    }
}

fn auth_context(ctx: SecurityContext) -> Option<AuthContext> {
    let claims = ctx.claims?;
    let user_id = ctx.user_id?;
    Some(AuthContext {
        user_id,
        subject: claims.sub,
        jti: claims.jti,
        scope: claims.scope,
        fingerprint: ctx.fingerprint,
        address: ctx.address,
        device_newly_registered: ctx.device_newly_registered,
    })
}
