//! Device fingerprint trust.

pub mod fingerprint;
pub mod memory;
pub mod trust;

pub use fingerprint::{DeviceSignals, derive_fingerprint};
pub use memory::MemoryDeviceRepository;
pub use trust::{DeviceDecision, DeviceTrustStore, RegistrationOutcome};
