//! The four ordered pipeline stages.

use std::time::Duration;

use tracing::{debug, warn};

use shopgate_auth::device::{DeviceDecision, RegistrationOutcome};
use shopgate_core::config::StoreFailurePolicy;
use shopgate_core::error::AppError;

use crate::error::Rejection;
use crate::state::AppState;

use super::context::SecurityContext;

/// Name of the limiter applied to every request, public or not.
const GLOBAL_LIMITER: &str = "global";

/// Result of one stage: pass the (possibly updated) context on, or
/// stop the pipeline with a rejection.
#[derive(Debug)]
pub enum StageOutcome {
    Continue(SecurityContext),
    Reject(Rejection),
}

/// Stage 1: global sliding-window rate limit, keyed by client address.
pub async fn rate_limit_stage(state: &AppState, ctx: SecurityContext) -> StageOutcome {
    let Some(limiter) = state.config.rate_limit.limiter(GLOBAL_LIMITER) else {
        return StageOutcome::Continue(ctx);
    };
    let window = Duration::from_millis(limiter.window_ms);

    match state
        .rate_limit_store
        .try_acquire(&limiter.name, &ctx.address, window, limiter.limit)
        .await
    {
        Ok(true) => StageOutcome::Continue(ctx),
        Ok(false) => {
            debug!(
                limiter = %limiter.name,
                client = %ctx.address,
                "Rate limit exceeded"
            );
            StageOutcome::Reject(Rejection {
                error: AppError::rate_limit("Too many requests"),
                retry_after: Some(window),
            })
        }
        Err(e) => match state.config.rate_limit.on_store_error {
            StoreFailurePolicy::FailClosed => {
                warn!(error = %e, "Rate limit store unreachable, failing closed");
                StageOutcome::Reject(
                    AppError::service_unavailable("Rate limit check unavailable").into(),
                )
            }
            StoreFailurePolicy::FailOpen => {
                warn!(error = %e, "Rate limit store unreachable, failing open");
                StageOutcome::Continue(ctx)
            }
        },
    }
}

/// Stage 2: bearer token validation and claim extraction.
pub async fn authenticate_stage(state: &AppState, mut ctx: SecurityContext) -> StageOutcome {
    let Some(token) = ctx.token.as_deref() else {
        return StageOutcome::Reject(
            AppError::authentication("Missing bearer token").into(),
        );
    };

    let claims = match state.authenticator.validate(token) {
        Ok(claims) => claims,
        Err(e) => return StageOutcome::Reject(e.into()),
    };

    let Some(user_id) = claims.user_id() else {
        debug!("Token rejected: subject is not a user id");
        return StageOutcome::Reject(
            AppError::authentication("Invalid or expired token").into(),
        );
    };

    ctx.user_id = Some(user_id);
    ctx.claims = Some(claims);
    StageOutcome::Continue(ctx)
}

/// Stage 3: replay rejection. Runs only after authentication, so every
/// jti it records came from a token with a valid signature.
pub async fn replay_stage(state: &AppState, ctx: SecurityContext) -> StageOutcome {
    let Some(claims) = ctx.claims.as_ref() else {
        return StageOutcome::Reject(
            AppError::internal("Replay stage reached without claims").into(),
        );
    };

    match state.replay_guard.check(claims).await {
        Ok(()) => StageOutcome::Continue(ctx),
        Err(e) => StageOutcome::Reject(e.into()),
    }
}

/// Stage 4: device trust. Binds the request's derived fingerprint to
/// the token's `dfp` claim, then verifies (and possibly registers) the
/// device record.
pub async fn device_stage(state: &AppState, mut ctx: SecurityContext) -> StageOutcome {
    let (Some(claims), Some(user_id)) = (ctx.claims.as_ref(), ctx.user_id) else {
        return StageOutcome::Reject(
            AppError::internal("Device stage reached without claims").into(),
        );
    };

    if !claims.dfp.is_empty() && claims.dfp != ctx.fingerprint {
        warn!(user_id = %user_id, "Fingerprint does not match token binding");
        return StageOutcome::Reject(
            AppError::device_forbidden("Device not recognized").into(),
        );
    }

    let decision = match state
        .device_trust
        .verify(user_id, &ctx.fingerprint, &ctx.address)
        .await
    {
        Ok(decision) => decision,
        Err(e) => return StageOutcome::Reject(e.into()),
    };

    match decision {
        DeviceDecision::Verified => StageOutcome::Continue(ctx),
        DeviceDecision::Inactive => StageOutcome::Reject(
            AppError::device_forbidden("Device has been deactivated").into(),
        ),
        DeviceDecision::Unknown => {
            if !state.device_trust.allows_unknown_devices() {
                return StageOutcome::Reject(
                    AppError::device_forbidden("Unrecognized device").into(),
                );
            }
            match state
                .device_trust
                .register_unknown(user_id, &ctx.fingerprint, &ctx.address)
                .await
            {
                Ok(RegistrationOutcome::Registered(_)) => {
                    ctx.device_newly_registered = true;
                    StageOutcome::Continue(ctx)
                }
                Ok(RegistrationOutcome::QuotaExceeded { active, max }) => {
                    debug!(user_id = %user_id, active, max, "Registration blocked by quota");
                    StageOutcome::Reject(
                        AppError::device_forbidden("Device limit reached").into(),
                    )
                }
                Err(e) => StageOutcome::Reject(e.into()),
            }
        }
    }
}
