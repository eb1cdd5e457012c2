//! Device trust configuration.

use serde::{Deserialize, Serialize};

/// Device trust verification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Maximum active devices per user.
    #[serde(default = "default_max_devices")]
    pub max_devices_per_user: i64,
    /// Whether unknown devices are registered and allowed through
    /// (`true`) or hard-blocked with a 403 (`false`).
    ///
    /// This is the single source of truth for unknown-device handling;
    /// the pipeline stage reads it once per request.
    #[serde(default = "default_allow_unknown")]
    pub allow_unknown_devices: bool,
    /// Whether to annotate newly seen addresses with a geolocation
    /// lookup (through the resilience wrapper).
    #[serde(default)]
    pub geolocate_new_addresses: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            max_devices_per_user: default_max_devices(),
            allow_unknown_devices: default_allow_unknown(),
            geolocate_new_addresses: false,
        }
    }
}

fn default_max_devices() -> i64 {
    5
}

fn default_allow_unknown() -> bool {
    true
}
