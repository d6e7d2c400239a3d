#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{request::Builder, Request};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use uuid::Uuid;

use portal_core::middleware::create_ip_rate_limiter;
use portal_service::{
    build_router,
    config::{
        AppConfig, DatabaseConfig, Environment, RateLimitConfig, RedisConfig, TokenConfig,
    },
    models::{Admin, PermissionGrantRow, PermissionRow, RoleGrantRow, RoleRow},
    services::{
        AdminStore, MockAdminStore, MockBlacklist, MockPolicyStore, MockUserStore, PolicyCache,
        PolicyData, TokenService,
    },
    utils::{hash_password, Password},
    AppState,
};

pub const CSRF_TOKEN: &str = "9f2d71c04a85e6b3d90f1e2a3b4c5d6e";

/// A fully wired backend over in-memory stores. Each test builds its own
/// composition root, so nothing leaks between tests.
pub struct TestBackend {
    pub app: Router,
    pub state: AppState,
    pub users: Arc<MockUserStore>,
    pub admins: Arc<MockAdminStore>,
    pub policy_store: Arc<MockPolicyStore>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        common: portal_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "portal-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        token: TokenConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            access_token_ttl_minutes: 15,
        },
        rate_limit: RateLimitConfig {
            global_ip_limit: 10_000,
            global_ip_window_seconds: 60,
        },
        request_timeout_seconds: 30,
    }
}

pub fn test_backend() -> TestBackend {
    let config = test_config();
    let users = Arc::new(MockUserStore::new());
    let admins = Arc::new(MockAdminStore::new());
    let policy_store = Arc::new(MockPolicyStore::new());

    let tokens = TokenService::new(&config.token);
    let policy = Arc::new(PolicyCache::new(policy_store.clone()));
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );

    let state = AppState {
        config,
        users: users.clone(),
        admins: admins.clone(),
        tokens,
        blacklist: Arc::new(MockBlacklist::new()),
        policy,
        ip_rate_limiter,
    };

    TestBackend {
        app: build_router(state.clone()),
        state,
        users,
        admins,
        policy_store,
    }
}

pub trait RequestBuilderExt {
    fn with_csrf(self) -> Self;
    fn with_bearer(self, token: &str) -> Self;
}

impl RequestBuilderExt for Builder {
    fn with_csrf(self) -> Self {
        self.header("cookie", format!("csrf_token={}", CSRF_TOKEN))
            .header("x-csrf-token", CSRF_TOKEN)
    }

    fn with_bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {}", token))
    }
}

pub fn json_body(value: serde_json::Value) -> Body {
    Body::from(value.to_string())
}

pub fn json_request(method: &str, uri: &str) -> Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

/// Seed an administrator directly into the store and return its id.
pub async fn seed_admin(backend: &TestBackend, name: &str, password: &str) -> Uuid {
    let now = Utc::now();
    let admin = Admin {
        id: Uuid::new_v4(),
        name: name.to_string(),
        password_hash: hash_password(&Password::new(password.to_string()))
            .expect("failed to hash password")
            .into_string(),
        created_at: now,
        updated_at: now,
    };
    backend
        .admins
        .insert(&admin)
        .await
        .expect("failed to seed admin");
    admin.id
}

/// Policy rows granting the reload permission to `admin_id` through an
/// `admin` role, mirroring a production grant chain.
pub fn reload_grant_for(admin_id: Uuid) -> PolicyData {
    let role = RoleRow {
        id: Uuid::new_v4(),
        name: "admin".to_string(),
    };
    let permission = PermissionRow {
        id: Uuid::new_v4(),
        object: "/api/admin/permission/reload".to_string(),
        action: "POST".to_string(),
    };
    PolicyData {
        permission_grants: vec![PermissionGrantRow {
            grantee: format!("role:{}", role.id),
            permission_id: permission.id,
        }],
        role_grants: vec![RoleGrantRow {
            subject: format!("admin:{}", admin_id),
            role_id: role.id,
        }],
        roles: vec![role],
        permissions: vec![permission],
    }
}
