//! `AuthUser` extractor: the identity the pipeline left in the
//! request extensions.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use shopgate_core::error::AppError;

use crate::error::Rejection;
use crate::pipeline::AuthContext;
use crate::state::AppState;

/// Authenticated user context available to protected handlers.
///
/// Present only on requests that passed the full security pipeline;
/// extracting it on a route outside the pipeline is a routing bug and
/// rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl std::ops::Deref for AuthUser {
    type Target = AuthContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::authentication("Not authenticated").into())
    }
}
