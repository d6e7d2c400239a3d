use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/user/register`.
///
/// Fields are `Option` so that an absent key reports `required` instead of
/// failing the decode; later rules only run once a value is present.
#[derive(Debug, Deserialize, Validate)]
pub struct UserRegisterRequest {
    #[validate(required)]
    pub name: Option<String>,

    #[validate(required, email(code = "email"))]
    pub email: Option<String>,

    #[validate(
        required,
        length(min = 8, code = "gte"),
        custom(function = "super::password_charset")
    )]
    pub password: Option<String>,
}

impl UserRegisterRequest {
    pub fn into_parts(self) -> (String, String, String) {
        (
            self.name.unwrap_or_default(),
            self.email.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )
    }
}

/// Body of `POST /api/user/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct UserLoginRequest {
    #[validate(required, email(code = "email"))]
    pub email: Option<String>,

    #[validate(required)]
    pub password: Option<String>,
}

impl UserLoginRequest {
    pub fn into_parts(self) -> (String, String) {
        (
            self.email.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )
    }
}

/// Body of `PUT /api/user/password`. The password rules are the same set
/// used at registration.
#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdatePasswordRequest {
    #[validate(required)]
    pub current_password: Option<String>,

    #[validate(
        required,
        length(min = 8, code = "gte"),
        custom(function = "super::password_charset")
    )]
    pub password: Option<String>,

    #[validate(required, must_match(other = "password", code = "eqfield"))]
    pub confirm_password: Option<String>,
}

impl UserUpdatePasswordRequest {
    pub fn into_parts(self) -> (String, String) {
        (
            self.current_password.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )
    }
}
