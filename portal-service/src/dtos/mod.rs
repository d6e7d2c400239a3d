//! Request and response bodies.
//!
//! Field names double as the external names reported in validation error
//! contexts, so they are spelled exactly like their JSON keys. The rule
//! keywords surfaced to clients are frozen: `required`, `email`, `gte`,
//! `containsany`, `eqfield`. New rules get new keywords; existing keywords
//! are never redefined.

pub mod admin;
pub mod user;

use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// Token payload returned by register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,
}

/// Shared password contract for registration and password change: at least
/// one lowercase letter, one uppercase letter and one digit (checked in
/// that order). Length is enforced separately by the `gte` rule.
pub fn password_charset(password: &str) -> Result<(), ValidationError> {
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lowercase && has_uppercase && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("containsany"))
    }
}
