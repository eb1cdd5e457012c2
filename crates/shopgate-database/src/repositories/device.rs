//! Device fingerprint repository backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use shopgate_core::error::{AppError, ErrorKind};
use shopgate_core::result::AppResult;
use shopgate_core::traits::DeviceRepository;
use shopgate_core::types::DeviceFingerprint;

/// PostgreSQL-backed [`DeviceRepository`].
#[derive(Debug, Clone)]
pub struct DeviceFingerprintRepository {
    pool: PgPool,
}

impl DeviceFingerprintRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRepository for DeviceFingerprintRepository {
    async fn find_by_user_and_fingerprint(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
    ) -> AppResult<Option<DeviceFingerprint>> {
        sqlx::query_as::<_, DeviceFingerprint>(
            r#"
            SELECT id, user_id, fingerprint_hash, active, trusted,
                   last_used_at, last_address, failed_attempts, created_at
            FROM device_fingerprints
            WHERE user_id = $1 AND fingerprint_hash = $2
            "#,
        )
        .bind(user_id)
        .bind(fingerprint_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to look up device record", e)
        })
    }

    async fn count_active_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM device_fingerprints WHERE user_id = $1 AND active = TRUE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count active devices", e)
        })
    }

    async fn create(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
        address: &str,
    ) -> AppResult<DeviceFingerprint> {
        sqlx::query_as::<_, DeviceFingerprint>(
            r#"
            INSERT INTO device_fingerprints
                (id, user_id, fingerprint_hash, active, trusted,
                 last_used_at, last_address, failed_attempts, created_at)
            VALUES ($1, $2, $3, TRUE, FALSE, NOW(), $4, 0, NOW())
            RETURNING id, user_id, fingerprint_hash, active, trusted,
                      last_used_at, last_address, failed_attempts, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(fingerprint_hash)
        .bind(address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create device record", e)
        })
    }

    async fn touch_match(&self, id: Uuid, address: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE device_fingerprints
            SET last_used_at = NOW(), last_address = $2, failed_attempts = 0
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(address)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update device record", e)
        })?;

        Ok(())
    }

    async fn record_failed_attempt(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE device_fingerprints SET failed_attempts = failed_attempts + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record device failure", e)
        })?;

        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE device_fingerprints SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to deactivate device", e)
            })?;

        Ok(())
    }

    async fn fingerprinting_disabled(&self, user_id: Uuid) -> AppResult<bool> {
        let disabled: Option<bool> = sqlx::query_scalar::<_, bool>(
            "SELECT fingerprinting_disabled FROM user_security_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to read security settings", e)
        })?;

        Ok(disabled.unwrap_or(false))
    }
}
