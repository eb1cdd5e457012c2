//! Shared types for the security pipeline.

pub mod device;

pub use device::DeviceFingerprint;
