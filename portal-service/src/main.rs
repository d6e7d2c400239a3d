use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;

use portal_core::middleware::create_ip_rate_limiter;
use portal_core::observability::init_tracing;

use portal_service::{
    build_router,
    config::AppConfig,
    services::{Database, PolicyCache, RedisService, TokenService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), portal_core::error::AppError> {
    // Load configuration - fail fast if invalid.
    let config = AppConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting portal service"
    );

    // An unreachable database at startup is a boot failure.
    let db = Database::connect(&config.database.url, config.database.max_connections).await?;
    db.migrate().await?;
    tracing::info!("Database initialized");

    let redis = RedisService::new(&config.redis.url)
        .await
        .map_err(portal_core::error::AppError::Cache)?;
    tracing::info!("Redis service initialized");

    let tokens = TokenService::new(&config.token);

    let db = Arc::new(db);
    let policy = Arc::new(PolicyCache::new(db.clone()));

    // A failed first load is not fatal: the cache stays empty and every
    // guarded route denies until an operator fixes the policy and reloads.
    if let Err(e) = policy.reload().await {
        tracing::error!(error = %e, "initial policy load failed; all guarded routes will deny");
    }

    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );

    let state = AppState {
        config: config.clone(),
        users: db.clone(),
        admins: db.clone(),
        tokens,
        blacklist: Arc::new(redis),
        policy,
        ip_rate_limiter,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
