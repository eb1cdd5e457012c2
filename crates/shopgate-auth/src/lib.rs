//! # shopgate-auth
//!
//! The security building blocks of the request pipeline: bearer token
//! verification with typed claims, the replay guard over a
//! probabilistic store, device fingerprint trust with a per-user
//! quota, and the outbound screening clients (geolocation,
//! breach-password, CAPTCHA) that call through resilience guards.

pub mod device;
pub mod replay;
pub mod screening;
pub mod token;

pub use device::{DeviceDecision, DeviceTrustStore, RegistrationOutcome};
pub use replay::ReplayGuard;
pub use token::{Claims, TokenAuthenticator};
