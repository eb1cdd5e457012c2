//! # shopgate-database
//!
//! PostgreSQL persistence for the Shopgate security pipeline: the
//! durable device fingerprint records and the per-user security
//! settings, plus pool setup and migrations.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use repositories::device::DeviceFingerprintRepository;
