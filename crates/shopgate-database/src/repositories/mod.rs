//! Repository implementations.

pub mod device;
