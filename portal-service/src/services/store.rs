use async_trait::async_trait;
use uuid::Uuid;

use portal_core::error::AppError;

use crate::models::{Admin, User};

/// End-user records. Implementations own their concurrency.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

/// Administrator records.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn insert(&self, admin: &Admin) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, AppError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Admin>, AppError>;
}
