//! The request-security pipeline.
//!
//! Four ordered stages run before any protected handler:
//! rate limit → authenticate → replay → device. Each stage takes the
//! context by value and either passes an updated context on or rejects
//! the request, which short-circuits the rest of the pipeline.

pub mod context;
pub mod orchestrator;
pub mod stages;

pub use context::{AuthContext, SecurityContext};
pub use orchestrator::security_pipeline;
pub use stages::StageOutcome;
