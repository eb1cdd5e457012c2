//! Trait seams between the security guards and their backing stores.

pub mod device;
pub mod rate_limit;
pub mod replay;

pub use device::DeviceRepository;
pub use rate_limit::RateLimitStore;
pub use replay::ReplayStore;
