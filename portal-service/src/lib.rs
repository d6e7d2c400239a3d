pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    BoxError, Router,
};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;

use portal_core::error::AppError;
use portal_core::middleware::{
    csrf_guard, ip_rate_limit_middleware, request_id_middleware, security_headers_middleware,
    IpRateLimiter,
};

use crate::config::AppConfig;
use crate::services::{AdminStore, PolicyCache, TokenBlacklist, TokenService, UserStore};

/// Composition root. Every collaborator is injected here so each test can
/// assemble its own, and no handler reaches for ambient state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserStore>,
    pub admins: Arc<dyn AdminStore>,
    pub tokens: TokenService,
    pub blacklist: Arc<dyn TokenBlacklist>,
    pub policy: Arc<PolicyCache>,
    pub ip_rate_limiter: IpRateLimiter,
}

/// Build the full router.
///
/// The `/api` tree carries a fixed middleware chain (CSRF, then rate
/// limiting, then per-group authentication and authorization) applied at
/// group level so a newly mounted route cannot skip it. Conflicting
/// registrations panic at startup.
pub fn build_router(state: AppState) -> Router {
    // Public routes: no bearer token, but CSRF still applies.
    let public_routes = Router::new()
        .route("/api/user/register", post(handlers::user::register))
        .route("/api/user/login", post(handlers::user::login))
        .route("/api/admin/login", post(handlers::admin::login))
        .route("/api/csrf/token", get(handlers::csrf::token));

    // Authenticated end-user routes.
    let user_routes = Router::new()
        .route("/api/user/password", put(handlers::user::update_password))
        .route("/api/user/me", get(handlers::user::me))
        .route("/api/user/logout", post(handlers::user::logout))
        .route_layer(from_fn_with_state(state.clone(), middleware::authenticate));

    // Authenticated administrator routes without a policy guard.
    let admin_routes = Router::new()
        .route("/api/admin/me", get(handlers::admin::me))
        .route_layer(from_fn_with_state(state.clone(), middleware::authenticate));

    // Policy-guarded administrator routes: authenticate, then authorize.
    let guarded_admin_routes = Router::new()
        .route(
            "/api/admin/permission/reload",
            post(handlers::admin::reload_permissions),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::authorize))
        .route_layer(from_fn_with_state(state.clone(), middleware::authenticate));

    let api = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(guarded_admin_routes)
        // Layers run outermost-last: CSRF is checked before the rate
        // limiter, which runs before any per-group authentication.
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(csrf_guard));

    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    Router::new()
        .route("/healthz", get(health_check))
        .merge(api)
        .with_state(state)
        // Request deadline, propagated by dropping the handler future.
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(portal_core::middleware::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

async fn handle_timeout_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Internal(anyhow::anyhow!("request deadline exceeded"))
    } else {
        AppError::Internal(anyhow::anyhow!(err.to_string()))
    }
}

/// Service health check: storage and cache must both answer.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "database health check failed");
        e
    })?;

    state.blacklist.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "cache health check failed");
        AppError::Cache(e)
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
