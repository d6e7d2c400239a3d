use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/admin/login`. Administrators sign in by name, not
/// email.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(required)]
    pub name: Option<String>,

    #[validate(required)]
    pub password: Option<String>,
}

impl AdminLoginRequest {
    pub fn into_parts(self) -> (String, String) {
        (
            self.name.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )
    }
}
