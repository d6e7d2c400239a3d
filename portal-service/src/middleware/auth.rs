//! Bearer-token authentication.
//!
//! Every failure collapses to a single external `Unauthorized`; whether
//! the token was missing, malformed, expired, revoked or orphaned is only
//! visible in the logs.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use portal_core::error::AppError;

use crate::services::{AccessTokenClaims, SubjectKind};
use crate::AppState;

/// The authenticated principal, attached to request extensions for
/// handlers and the authorizer.
#[derive(Debug, Clone)]
pub struct CurrentSubject {
    pub id: Uuid,
    pub kind: SubjectKind,
    pub name: String,
}

impl CurrentSubject {
    /// Key under which this subject appears in policy grants.
    pub fn policy_key(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.id)
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("missing bearer token")))?;

    let claims = state.tokens.validate_access_token(token).map_err(|e| {
        tracing::warn!(error = %e, "access token rejected");
        AppError::Unauthorized(anyhow::anyhow!("invalid access token"))
    })?;

    let revoked = state
        .blacklist
        .is_blacklisted(&claims.jti)
        .await
        .map_err(AppError::Cache)?;
    if revoked {
        tracing::warn!(jti = %claims.jti, "revoked access token presented");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "access token revoked"
        )));
    }

    let subject_id: Uuid = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("malformed subject id")))?;

    // A token must not outlive its subject.
    let subject = match claims.kind {
        SubjectKind::User => state
            .users
            .find_by_id(subject_id)
            .await?
            .map(|user| CurrentSubject {
                id: user.id,
                kind: SubjectKind::User,
                name: user.name,
            }),
        SubjectKind::Admin => state
            .admins
            .find_by_id(subject_id)
            .await?
            .map(|admin| CurrentSubject {
                id: admin.id,
                kind: SubjectKind::Admin,
                name: admin.name,
            }),
    };

    let subject = subject.ok_or_else(|| {
        tracing::warn!(subject = %claims.sub, kind = claims.kind.as_str(), "token subject no longer exists");
        AppError::Unauthorized(anyhow::anyhow!("unknown subject"))
    })?;

    req.extensions_mut().insert(subject);
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extractor for the authenticated subject in handlers.
pub struct AuthSubject(pub CurrentSubject);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthSubject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = parts.extensions.get::<CurrentSubject>().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "authenticated subject missing from request extensions"
            ))
        })?;

        Ok(AuthSubject(subject.clone()))
    }
}

/// Extractor for the raw claims, used where the token itself matters
/// (logout needs the jti and expiry).
pub struct BearerClaims(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<AccessTokenClaims>().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "access token claims missing from request extensions"
            ))
        })?;

        Ok(BearerClaims(claims.clone()))
    }
}
