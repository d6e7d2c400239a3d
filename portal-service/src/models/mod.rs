//! Persistent record shapes.
//!
//! Password hashes never cross an interface boundary: handlers expose the
//! `Sanitized*` views only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn sanitized(&self) -> SanitizedAdmin {
        SanitizedAdmin {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizedAdmin {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: Uuid,
    pub name: String,
}

/// A permission is an (object, action) pair. The object is a request path
/// or a `/prefix/*` pattern; the action is an upper-case HTTP method or `*`.
#[derive(Debug, Clone, FromRow)]
pub struct PermissionRow {
    pub id: Uuid,
    pub object: String,
    pub action: String,
}

/// Subject-to-role grant. `subject` is a policy key (`user:<id>` or
/// `admin:<id>`).
#[derive(Debug, Clone, FromRow)]
pub struct RoleGrantRow {
    pub subject: String,
    pub role_id: Uuid,
}

/// Permission grant. `grantee` is either a subject policy key or
/// `role:<id>`.
#[derive(Debug, Clone, FromRow)]
pub struct PermissionGrantRow {
    pub grantee: String,
    pub permission_id: Uuid,
}
