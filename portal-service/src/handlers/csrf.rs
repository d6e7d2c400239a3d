use axum::http::StatusCode;

/// Safe endpoint whose only job is to let the CSRF guard prime the cookie
/// on clients that have not made any safe request yet.
pub async fn token() -> StatusCode {
    StatusCode::NO_CONTENT
}
