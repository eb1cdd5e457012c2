//! # shopgate-api
//!
//! The HTTP surface: application state, error → response mapping, the
//! security pipeline middleware and its stages, extractors, and a
//! minimal set of handlers (health plus a sample protected route
//! standing in for business endpoints).

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod pipeline;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
