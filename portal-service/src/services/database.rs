//! PostgreSQL storage for subjects and policy rows.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use portal_core::error::AppError;

use crate::models::{
    Admin, PermissionGrantRow, PermissionRow, RoleGrantRow, RoleRow, User,
};
use crate::services::policy::{PolicyData, PolicyStore};
use crate::services::store::{AdminStore, UserStore};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to connect: {}", e)))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Migration failed: {}", e)))?;
        Ok(())
    }
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(anyhow::anyhow!(e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl UserStore for Database {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(anyhow::anyhow!("email already registered"))
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                db_err(e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl AdminStore for Database {
    async fn insert(&self, admin: &Admin) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, name, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(admin.id)
        .bind(&admin.name)
        .bind(&admin.password_hash)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(anyhow::anyhow!("admin name already registered"))
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, AppError> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Admin>, AppError> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl PolicyStore for Database {
    /// Enumerate all policy rows in one transaction so the snapshot sees a
    /// consistent view.
    async fn load_policy(&self) -> Result<PolicyData, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let roles = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles")
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err)?;

        let permissions =
            sqlx::query_as::<_, PermissionRow>("SELECT id, object, action FROM permissions")
                .fetch_all(&mut *tx)
                .await
                .map_err(db_err)?;

        let role_grants =
            sqlx::query_as::<_, RoleGrantRow>("SELECT subject, role_id FROM role_grants")
                .fetch_all(&mut *tx)
                .await
                .map_err(db_err)?;

        let permission_grants = sqlx::query_as::<_, PermissionGrantRow>(
            "SELECT grantee, permission_id FROM permission_grants",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(PolicyData {
            roles,
            permissions,
            role_grants,
            permission_grants,
        })
    }
}
