//! In-memory stores. Tests build their own composition root from these so
//! the whole router can be exercised without Postgres or Redis.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use portal_core::error::AppError;

use crate::models::{Admin, User};
use crate::services::policy::{PolicyData, PolicyStore};
use crate::services::store::{AdminStore, UserStore};

#[derive(Default)]
pub struct MockUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MockUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user, simulating deletion behind a still-live token.
    pub fn remove(&self, id: Uuid) {
        self.users.lock().expect("user store poisoned").remove(&id);
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock().expect("user store poisoned");
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "email already registered"
            )));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .expect("user store poisoned")
            .get(&id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .expect("user store poisoned")
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().expect("user store poisoned");
        if let Some(user) = users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAdminStore {
    admins: Mutex<HashMap<Uuid, Admin>>,
}

impl MockAdminStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminStore for MockAdminStore {
    async fn insert(&self, admin: &Admin) -> Result<(), AppError> {
        let mut admins = self.admins.lock().expect("admin store poisoned");
        if admins.values().any(|a| a.name == admin.name) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "admin name already registered"
            )));
        }
        admins.insert(admin.id, admin.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, AppError> {
        Ok(self
            .admins
            .lock()
            .expect("admin store poisoned")
            .get(&id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Admin>, AppError> {
        Ok(self
            .admins
            .lock()
            .expect("admin store poisoned")
            .values()
            .find(|a| a.name == name)
            .cloned())
    }
}

/// Policy store whose rows can be replaced between reloads.
#[derive(Default)]
pub struct MockPolicyStore {
    data: Mutex<PolicyData>,
}

impl MockPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_policy(&self, data: PolicyData) {
        *self.data.lock().expect("policy store poisoned") = data;
    }
}

#[async_trait]
impl PolicyStore for MockPolicyStore {
    async fn load_policy(&self) -> Result<PolicyData, AppError> {
        Ok(self.data.lock().expect("policy store poisoned").clone())
    }
}
