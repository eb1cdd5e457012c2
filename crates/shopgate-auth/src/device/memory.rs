//! In-memory device repository for single-node use and tests.

use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use shopgate_core::error::AppError;
use shopgate_core::result::AppResult;
use shopgate_core::traits::DeviceRepository;
use shopgate_core::types::DeviceFingerprint;

/// [`DeviceRepository`] backed by process memory. Same semantics as
/// the Postgres repository, without durability.
#[derive(Debug, Default)]
pub struct MemoryDeviceRepository {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Uuid, DeviceFingerprint>,
    opted_out: HashSet<Uuid>,
}

impl MemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a user as having opted out of fingerprinting.
    pub fn disable_fingerprinting(&self, user_id: Uuid) {
        self.inner.lock().opted_out.insert(user_id);
    }
}

#[async_trait]
impl DeviceRepository for MemoryDeviceRepository {
    async fn find_by_user_and_fingerprint(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
    ) -> AppResult<Option<DeviceFingerprint>> {
        let inner = self.inner.lock();
        Ok(inner
            .records
            .values()
            .find(|r| r.user_id == user_id && r.fingerprint_hash == fingerprint_hash)
            .cloned())
    }

    async fn count_active_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let inner = self.inner.lock();
        Ok(inner
            .records
            .values()
            .filter(|r| r.user_id == user_id && r.active)
            .count() as i64)
    }

    async fn create(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
        address: &str,
    ) -> AppResult<DeviceFingerprint> {
        let mut inner = self.inner.lock();
        if inner
            .records
            .values()
            .any(|r| r.user_id == user_id && r.fingerprint_hash == fingerprint_hash)
        {
            return Err(AppError::database("Device record already exists"));
        }
        let now = Utc::now();
        let record = DeviceFingerprint {
            id: Uuid::new_v4(),
            user_id,
            fingerprint_hash: fingerprint_hash.to_string(),
            active: true,
            trusted: false,
            last_used_at: now,
            last_address: address.to_string(),
            failed_attempts: 0,
            created_at: now,
        };
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn touch_match(&self, id: Uuid, address: &str) -> AppResult<()> {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.records.get_mut(&id) {
            record.last_used_at = Utc::now();
            record.last_address = address.to_string();
            record.failed_attempts = 0;
        }
        Ok(())
    }

    async fn record_failed_attempt(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.records.get_mut(&id) {
            record.failed_attempts += 1;
        }
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.records.get_mut(&id) {
            record.active = false;
        }
        Ok(())
    }

    async fn fingerprinting_disabled(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self.inner.lock().opted_out.contains(&user_id))
    }
}
