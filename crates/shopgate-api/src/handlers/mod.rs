//! HTTP handlers.

pub mod health;
pub mod profile;
pub mod screening;
