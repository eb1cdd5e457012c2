//! Sample protected handler.
//!
//! Stands in for the shop's business endpoints; anything reaching it
//! has passed the full security pipeline.

use axum::Json;
use serde_json::{Value, json};

use crate::extractors::AuthUser;

pub async fn get_profile(user: AuthUser) -> Json<Value> {
    Json(json!({
        "userId": user.user_id,
        "subject": user.subject,
        "scope": user.scope,
        "deviceNewlyRegistered": user.device_newly_registered,
    }))
}
