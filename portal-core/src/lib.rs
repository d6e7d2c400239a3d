//! portal-core: shared HTTP plumbing for the portal backend.
//!
//! Response envelope, error taxonomy, cross-cutting middleware and the
//! validated-JSON extractor used by every route group.

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod observability;
pub mod response;

pub use axum;
pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
