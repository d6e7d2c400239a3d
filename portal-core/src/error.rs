use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::{validation_error_context, ErrorBody, ErrorMessage};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("request body decode failed: {0}")]
    BodyDecode(String),

    #[error("unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("too many requests")]
    TooManyRequests(Option<u64>),

    #[error("database error: {0}")]
    Database(anyhow::Error),

    #[error("cache error: {0}")]
    Cache(anyhow::Error),

    #[error("configuration error: {0}")]
    Config(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, context, retry_after) = match &self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorMessage::RequestValidationFailed,
                Some(validation_error_context(errors)),
                None,
            ),
            AppError::BodyDecode(_) => (
                StatusCode::BAD_REQUEST,
                ErrorMessage::RequestValidationFailed,
                None,
                None,
            ),
            AppError::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, ErrorMessage::Unauthorized, None, None)
            }
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorMessage::Forbidden, None, None),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorMessage::Conflict, None, None),
            AppError::TooManyRequests(retry) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorMessage::TooManyRequests,
                None,
                *retry,
            ),
            AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Config(_)
            | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorMessage::InternalError,
                None,
                None,
            ),
        };

        // The cause never leaves the process; it is logged inside the request
        // span, which carries the correlation id echoed to the client.
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "request failed");
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!(error = %self, "request rejected");
            }
            _ => {
                tracing::debug!(error = %self, "request rejected");
            }
        }

        let mut response =
            (status, Json(ErrorBody::new(message, context))).into_response();

        if let Some(retry) = retry_after {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        response
    }
}
