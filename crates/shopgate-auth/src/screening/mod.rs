//! Outbound screening services.
//!
//! Every call here goes through a named resilience guard; none of
//! these dependencies may stall or cascade a request.

pub mod breach;
pub mod captcha;
pub mod geolocation;

pub use breach::BreachPasswordClient;
pub use captcha::CaptchaClient;
pub use geolocation::{GeoLocation, GeolocationClient};
