use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use portal_core::{error::AppError, extract::ValidatedJson, response::Data};

use crate::dtos::admin::AdminLoginRequest;
use crate::dtos::TokenData;
use crate::middleware::AuthSubject;
use crate::services::SubjectKind;
use crate::utils::{verify_password, Password, PasswordHashString};
use crate::AppState;

/// Exchange an administrator name and password for an access token.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (name, password) = req.into_parts();

    let admin = state
        .admins
        .find_by_name(&name)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("unknown admin")))?;

    verify_password(
        &Password::new(password),
        &PasswordHashString::new(admin.password_hash.clone()),
    )
    .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("invalid credentials")))?;

    let access_token = state
        .tokens
        .generate_access_token(admin.id, SubjectKind::Admin)?;

    Ok(Json(Data::new(TokenData { access_token })))
}

/// Current administrator's profile.
pub async fn me(
    State(state): State<AppState>,
    AuthSubject(subject): AuthSubject,
) -> Result<impl IntoResponse, AppError> {
    if subject.kind != SubjectKind::Admin {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "token is not an admin token"
        )));
    }

    let admin = state
        .admins
        .find_by_id(subject.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("unknown subject")))?;

    Ok(Json(Data::new(admin.sanitized())))
}

/// Rebuild the policy snapshot from durable storage and publish it.
///
/// In-flight requests finish against the snapshot they captured; everyone
/// who observes this 204 sees the new policy afterwards. A failed load or
/// validation keeps the previous snapshot active.
pub async fn reload_permissions(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.policy.reload().await?;
    Ok(StatusCode::NO_CONTENT)
}
