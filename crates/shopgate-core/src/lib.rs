//! # shopgate-core
//!
//! Core crate for the Shopgate security pipeline. Contains store and
//! repository traits, configuration schemas, the device record type,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Shopgate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
