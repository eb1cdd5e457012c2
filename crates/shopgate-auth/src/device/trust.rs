//! Device trust decisions and registration.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shopgate_core::config::DeviceConfig;
use shopgate_core::result::AppResult;
use shopgate_core::traits::DeviceRepository;
use shopgate_core::types::DeviceFingerprint;

use crate::screening::GeolocationClient;

/// Outcome of verifying a (user, fingerprint) pair. Plain data; the
/// pipeline stage decides what each variant means for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceDecision {
    /// The fingerprint matches an active record (or the user has
    /// opted out of fingerprinting).
    Verified,
    /// No record exists for this pair yet.
    Unknown,
    /// A record exists but has been deactivated.
    Inactive,
}

/// Outcome of registering a previously unknown device.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Registered(DeviceFingerprint),
    QuotaExceeded { active: i64, max: i64 },
}

/// Verifies device fingerprints against durable records and registers
/// new ones subject to the per-user quota.
#[derive(Clone)]
pub struct DeviceTrustStore {
    repository: Arc<dyn DeviceRepository>,
    config: DeviceConfig,
    geolocation: Option<Arc<GeolocationClient>>,
}

impl std::fmt::Debug for DeviceTrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTrustStore")
            .field("config", &self.config)
            .finish()
    }
}

impl DeviceTrustStore {
    pub fn new(
        repository: Arc<dyn DeviceRepository>,
        config: DeviceConfig,
        geolocation: Option<Arc<GeolocationClient>>,
    ) -> Self {
        Self {
            repository,
            config,
            geolocation,
        }
    }

    /// Whether unknown devices are soft-allowed (registered and let
    /// through) rather than hard-blocked.
    pub fn allows_unknown_devices(&self) -> bool {
        self.config.allow_unknown_devices
    }

    /// Verify a fingerprint for a user. A successful match updates the
    /// record's last-used metadata; a match on a deactivated record
    /// counts as a failed attempt.
    pub async fn verify(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
        address: &str,
    ) -> AppResult<DeviceDecision> {
        if self.repository.fingerprinting_disabled(user_id).await? {
            debug!(user_id = %user_id, "User opted out of device fingerprinting");
            return Ok(DeviceDecision::Verified);
        }

        match self
            .repository
            .find_by_user_and_fingerprint(user_id, fingerprint_hash)
            .await?
        {
            Some(record) if record.can_authorize() => {
                self.repository.touch_match(record.id, address).await?;
                Ok(DeviceDecision::Verified)
            }
            Some(record) => {
                warn!(
                    user_id = %user_id,
                    device_id = %record.id,
                    "Deactivated device attempted authorization"
                );
                self.repository.record_failed_attempt(record.id).await?;
                Ok(DeviceDecision::Inactive)
            }
            None => Ok(DeviceDecision::Unknown),
        }
    }

    /// Register an unknown device, respecting the active-device quota.
    /// Quota exhaustion is an outcome, not an error; no record is
    /// created in that case.
    pub async fn register_unknown(
        &self,
        user_id: Uuid,
        fingerprint_hash: &str,
        address: &str,
    ) -> AppResult<RegistrationOutcome> {
        let active = self.repository.count_active_by_user(user_id).await?;
        if active >= self.config.max_devices_per_user {
            warn!(
                user_id = %user_id,
                active,
                max = self.config.max_devices_per_user,
                "Device quota exceeded"
            );
            return Ok(RegistrationOutcome::QuotaExceeded {
                active,
                max: self.config.max_devices_per_user,
            });
        }

        let record = self
            .repository
            .create(user_id, fingerprint_hash, address)
            .await?;
        info!(user_id = %user_id, device_id = %record.id, "Registered new device");

        self.annotate_address(address).await;

        Ok(RegistrationOutcome::Registered(record))
    }

    /// Revoke a device. The record is deactivated, never deleted.
    pub async fn revoke(&self, device_id: Uuid) -> AppResult<()> {
        self.repository.deactivate(device_id).await
    }

    /// Best-effort geolocation annotation of a newly seen address.
    /// Lookup failures are logged, never surfaced.
    async fn annotate_address(&self, address: &str) {
        if !self.config.geolocate_new_addresses {
            return;
        }
        let Some(geo) = &self.geolocation else {
            return;
        };
        match geo.lookup(address).await {
            Ok(Some(location)) => {
                info!(address, location = %location, "New device address located");
            }
            Ok(None) => debug!(address, "No geolocation data for address"),
            Err(e) => debug!(address, error = %e, "Geolocation lookup failed"),
        }
    }
}
