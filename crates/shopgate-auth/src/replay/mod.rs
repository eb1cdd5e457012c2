//! Replay prevention keyed on the token id.

pub mod cleanup;
pub mod guard;

pub use cleanup::ReplayCleanup;
pub use guard::ReplayGuard;
