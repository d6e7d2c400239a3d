use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use portal_core::{error::AppError, extract::ValidatedJson, response::Data};

use crate::dtos::user::{UserLoginRequest, UserRegisterRequest, UserUpdatePasswordRequest};
use crate::dtos::TokenData;
use crate::middleware::{AuthSubject, BearerClaims};
use crate::models::User;
use crate::services::SubjectKind;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};
use crate::AppState;

/// Register a new user and sign them in.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UserRegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (name, email, password) = req.into_parts();

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "email already registered"
        )));
    }

    let password_hash = hash_password(&Password::new(password))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash: password_hash.into_string(),
        created_at: now,
        updated_at: now,
    };
    state.users.insert(&user).await?;

    tracing::info!(user_id = %user.id, "user registered");

    let access_token = state
        .tokens
        .generate_access_token(user.id, SubjectKind::User)?;

    Ok(Json(Data::new(TokenData { access_token })))
}

/// Exchange email and password for an access token.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UserLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = req.into_parts();

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("unknown email")))?;

    verify_password(
        &Password::new(password),
        &PasswordHashString::new(user.password_hash.clone()),
    )
    .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("invalid credentials")))?;

    let access_token = state
        .tokens
        .generate_access_token(user.id, SubjectKind::User)?;

    Ok(Json(Data::new(TokenData { access_token })))
}

/// Current user's profile, without the password hash.
pub async fn me(
    State(state): State<AppState>,
    AuthSubject(subject): AuthSubject,
) -> Result<impl IntoResponse, AppError> {
    if subject.kind != SubjectKind::User {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "token is not a user token"
        )));
    }

    let user = state
        .users
        .find_by_id(subject.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("unknown subject")))?;

    Ok(Json(Data::new(user.sanitized())))
}

/// Change the current user's password. The new password obeys the same
/// rules as registration; the current one must verify first.
pub async fn update_password(
    State(state): State<AppState>,
    AuthSubject(subject): AuthSubject,
    ValidatedJson(req): ValidatedJson<UserUpdatePasswordRequest>,
) -> Result<StatusCode, AppError> {
    if subject.kind != SubjectKind::User {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "token is not a user token"
        )));
    }

    let (current_password, password) = req.into_parts();

    let user = state
        .users
        .find_by_id(subject.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("unknown subject")))?;

    verify_password(
        &Password::new(current_password),
        &PasswordHashString::new(user.password_hash.clone()),
    )
    .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("current password mismatch")))?;

    let password_hash = hash_password(&Password::new(password))?;
    state
        .users
        .update_password(user.id, password_hash.as_str())
        .await?;

    tracing::info!(user_id = %user.id, "user password updated");

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke the presented token until its natural expiry.
pub async fn logout(
    State(state): State<AppState>,
    BearerClaims(claims): BearerClaims,
) -> Result<StatusCode, AppError> {
    let remaining = claims.exp - Utc::now().timestamp();
    state
        .blacklist
        .blacklist_token(&claims.jti, remaining)
        .await
        .map_err(AppError::Cache)?;

    Ok(StatusCode::NO_CONTENT)
}
