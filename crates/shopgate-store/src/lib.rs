//! # shopgate-store
//!
//! Distributed store providers for the Shopgate security pipeline.
//!
//! Two backends implement the [`shopgate_core::traits::ReplayStore`] and
//! [`shopgate_core::traits::RateLimitStore`] seams:
//!
//! - `redis`: shared across all server instances; operations that must
//!   be atomic (replay check-and-record, sliding-window acquisition) run
//!   as single Lua scripts.
//! - `memory`: in-process, for single-node deployments and tests.

pub mod bloom;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::StoreManager;
