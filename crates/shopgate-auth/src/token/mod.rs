//! Bearer token verification.

pub mod authenticator;
pub mod claims;

pub use authenticator::TokenAuthenticator;
pub use claims::Claims;
