//! Device repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::DeviceFingerprint;

/// Repository seam for durable device fingerprint records.
///
/// Queries are by equality only; records are deactivated, never deleted.
#[async_trait]
pub trait DeviceRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find the record for a (user, fingerprint) pair.
    async fn find_by_user_and_fingerprint(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
    ) -> AppResult<Option<DeviceFingerprint>>;

    /// Count the user's currently active devices.
    async fn count_active_by_user(&self, user_id: Uuid) -> AppResult<i64>;

    /// Insert a new record with `active = true, trusted = false`.
    async fn create(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
        address: &str,
    ) -> AppResult<DeviceFingerprint>;

    /// Update last-used timestamp and address, and reset the
    /// failed-attempt counter, after a successful match.
    async fn touch_match(&self, id: Uuid, address: &str) -> AppResult<()>;

    /// Increment the failed-attempt counter.
    async fn record_failed_attempt(&self, id: Uuid) -> AppResult<()>;

    /// Deactivate a record (revocation). The record is kept for audit.
    async fn deactivate(&self, id: Uuid) -> AppResult<()>;

    /// Whether the user has opted out of device fingerprinting entirely.
    async fn fingerprinting_disabled(&self, user_id: Uuid) -> AppResult<bool>;
}
