pub mod auth;
pub mod authorize;

pub use auth::{authenticate, AuthSubject, BearerClaims, CurrentSubject};
pub use authorize::authorize;
