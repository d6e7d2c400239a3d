//! Double-submit CSRF guard.
//!
//! Non-safe methods must carry matching values in the `csrf_token` cookie
//! and the `x-csrf-token` header; a miss is a 403 before any other check
//! runs. Safe methods pass through and receive the cookie when they do not
//! already hold one, so a prior safe request primes every client.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::error::AppError;

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Constant-time comparison of the submitted token pair.
pub fn tokens_match(cookie_value: &str, header_value: &str) -> bool {
    !cookie_value.is_empty()
        && cookie_value
            .as_bytes()
            .ct_eq(header_value.as_bytes())
            .into()
}

fn issue_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn csrf_guard(req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    if is_safe_method(req.method()) {
        let needs_cookie = jar.get(CSRF_COOKIE).is_none();
        let mut response = next.run(req).await;
        if needs_cookie {
            let cookie = Cookie::build((CSRF_COOKIE, issue_token()))
                .path("/")
                .same_site(SameSite::Strict)
                .http_only(false)
                .build();
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        return response;
    }

    let cookie_token = jar.get(CSRF_COOKIE).map(|c| c.value().to_string());
    let header_token = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    match (cookie_token, header_token) {
        (Some(cookie), Some(header)) if tokens_match(&cookie, &header) => next.run(req).await,
        _ => AppError::Forbidden(anyhow::anyhow!("csrf token missing or mismatched"))
            .into_response(),
    }
}
