//! Device fingerprint record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durable device fingerprint record.
///
/// At most one record exists per (user, fingerprint) pair. Records are
/// deactivated on revocation, never deleted, so the device history stays
/// available for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DeviceFingerprint {
    /// Record id.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Derived fingerprint hash (hex-encoded SHA-256).
    pub fingerprint_hash: String,
    /// Whether the device may authorize requests.
    pub active: bool,
    /// Whether an out-of-band trust step has been completed.
    pub trusted: bool,
    /// Last successful match.
    pub last_used_at: DateTime<Utc>,
    /// Network address seen at the last successful match.
    pub last_address: String,
    /// Consecutive failed verification attempts.
    pub failed_attempts: i32,
    /// First time this device was seen.
    pub created_at: DateTime<Utc>,
}

impl DeviceFingerprint {
    /// Whether this record may currently authorize a request.
    pub fn can_authorize(&self) -> bool {
        self.active
    }
}
