//! Policy-based authorization.
//!
//! Runs strictly after [`super::authenticate`]. The snapshot pointer is
//! captured once here; the decision and anything the handler does
//! afterwards see the same policy even if a reload lands mid-request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use portal_core::error::AppError;

use crate::middleware::auth::CurrentSubject;
use crate::services::normalize_object;
use crate::AppState;

pub async fn authorize(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let subject = req
        .extensions()
        .get::<CurrentSubject>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("no authenticated subject")))?;

    let snapshot = match state.policy.current() {
        Some(snapshot) => snapshot,
        None => {
            tracing::warn!("no policy snapshot loaded; denying by default");
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "authorization policy unavailable"
            )));
        }
    };

    let object = normalize_object(req.uri().path()).to_string();
    let action = req.method().as_str().to_uppercase();

    if snapshot.is_allowed(&subject.policy_key(), &object, &action) {
        Ok(next.run(req).await)
    } else {
        tracing::warn!(
            subject = %subject.policy_key(),
            object = %object,
            action = %action,
            "policy denied request"
        );
        Err(AppError::Forbidden(anyhow::anyhow!("permission denied")))
    }
}
