//! Authorization policy cache.
//!
//! Decisions are answered from an immutable [`PolicySnapshot`] that is
//! built off-path from durable storage and published with one atomic
//! pointer swap. A request captures the pointer once and keeps it for its
//! whole lifetime, so a concurrent reload is never partially observable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use uuid::Uuid;

use portal_core::error::AppError;

use crate::models::{PermissionGrantRow, PermissionRow, RoleGrantRow, RoleRow};

/// Everything the snapshot builder needs, enumerated consistently.
#[derive(Debug, Clone, Default)]
pub struct PolicyData {
    pub roles: Vec<RoleRow>,
    pub permissions: Vec<PermissionRow>,
    pub role_grants: Vec<RoleGrantRow>,
    pub permission_grants: Vec<PermissionGrantRow>,
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn load_policy(&self) -> Result<PolicyData, AppError>;
}

const ROLE_GRANTEE_PREFIX: &str = "role:";

#[derive(Debug, Default)]
struct SubjectGrants {
    exact: HashSet<(String, String)>,
    /// `(object-prefix, action)` pairs, longest prefix first.
    prefixes: Vec<(String, String)>,
}

impl SubjectGrants {
    fn insert(&mut self, object: &str, action: &str) {
        if let Some(prefix) = object.strip_suffix("/*") {
            self.prefixes
                .push((format!("{}/", prefix), action.to_string()));
        } else {
            self.exact.insert((object.to_string(), action.to_string()));
        }
    }

    fn allows(&self, object: &str, action: &str) -> bool {
        // Exact objects take precedence over prefixes; among prefixes the
        // longest match decides. Allow-only semantics make the order a
        // determinism guarantee rather than a correctness one.
        if self.exact.contains(&(object.to_string(), action.to_string()))
            || self.exact.contains(&(object.to_string(), "*".to_string()))
        {
            return true;
        }
        self.prefixes.iter().any(|(prefix, granted_action)| {
            object.starts_with(prefix.as_str())
                && (granted_action == action || granted_action == "*")
        })
    }
}

/// Immutable decision table: subject policy key -> granted permissions,
/// with role grants flattened at build time.
#[derive(Debug, Default)]
pub struct PolicySnapshot {
    grants: HashMap<String, SubjectGrants>,
}

impl PolicySnapshot {
    /// Build and validate a snapshot from enumerated policy rows.
    ///
    /// Rejects dangling role references and malformed permissions so a
    /// half-written policy can never be published.
    pub fn build(data: &PolicyData) -> Result<Self, AppError> {
        let roles: HashMap<Uuid, &RoleRow> = data.roles.iter().map(|r| (r.id, r)).collect();
        let permissions: HashMap<Uuid, &PermissionRow> =
            data.permissions.iter().map(|p| (p.id, p)).collect();

        for permission in &data.permissions {
            if !permission.object.starts_with('/') {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "malformed permission object {:?}: must start with '/'",
                    permission.object
                )));
            }
            if permission.action.is_empty() {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "malformed permission {:?}: empty action",
                    permission.object
                )));
            }
        }

        // role_id -> permissions granted to that role
        let mut role_permissions: HashMap<Uuid, Vec<&PermissionRow>> = HashMap::new();
        let mut subject_permissions: HashMap<&str, Vec<&PermissionRow>> = HashMap::new();

        for grant in &data.permission_grants {
            let permission = permissions.get(&grant.permission_id).copied().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "permission grant for {:?} references unknown permission {}",
                    grant.grantee,
                    grant.permission_id
                ))
            })?;

            if let Some(role_id) = grant.grantee.strip_prefix(ROLE_GRANTEE_PREFIX) {
                let role_id: Uuid = role_id.parse().map_err(|_| {
                    AppError::Internal(anyhow::anyhow!(
                        "malformed role grantee {:?}",
                        grant.grantee
                    ))
                })?;
                if !roles.contains_key(&role_id) {
                    return Err(AppError::Internal(anyhow::anyhow!(
                        "permission grant references unknown role {}",
                        role_id
                    )));
                }
                role_permissions.entry(role_id).or_default().push(permission);
            } else {
                subject_permissions
                    .entry(grant.grantee.as_str())
                    .or_default()
                    .push(permission);
            }
        }

        let mut grants: HashMap<String, SubjectGrants> = HashMap::new();

        for (subject, permissions) in subject_permissions {
            let entry = grants.entry(subject.to_string()).or_default();
            for permission in permissions {
                entry.insert(&permission.object, &permission.action);
            }
        }

        for grant in &data.role_grants {
            if !roles.contains_key(&grant.role_id) {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "role grant for {:?} references unknown role {}",
                    grant.subject,
                    grant.role_id
                )));
            }
            let entry = grants.entry(grant.subject.clone()).or_default();
            if let Some(permissions) = role_permissions.get(&grant.role_id) {
                for permission in permissions {
                    entry.insert(&permission.object, &permission.action);
                }
            }
        }

        for subject_grants in grants.values_mut() {
            subject_grants
                .prefixes
                .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.cmp(b)));
        }

        Ok(Self { grants })
    }

    /// Answer whether `subject` may perform `action` on `object`.
    /// Implicit deny: unknown subjects and uncovered pairs are refused.
    pub fn is_allowed(&self, subject: &str, object: &str, action: &str) -> bool {
        self.grants
            .get(subject)
            .map(|grants| grants.allows(object, action))
            .unwrap_or(false)
    }
}

/// Normalize a request path into a permission object: strip the trailing
/// slash (the query string is not part of `uri.path()`).
pub fn normalize_object(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Holder of the currently published snapshot.
pub struct PolicyCache {
    store: Arc<dyn PolicyStore>,
    current: ArcSwapOption<PolicySnapshot>,
}

impl PolicyCache {
    /// Start with no snapshot: every decision denies until the first
    /// successful [`PolicyCache::reload`].
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self {
            store,
            current: ArcSwapOption::empty(),
        }
    }

    /// Read the full policy, build and validate a fresh snapshot, then
    /// publish it atomically. On failure the previous snapshot stays
    /// active. Idempotent.
    pub async fn reload(&self) -> Result<(), AppError> {
        let data = self.store.load_policy().await?;
        let snapshot = PolicySnapshot::build(&data)?;
        self.current.store(Some(Arc::new(snapshot)));
        tracing::info!(
            roles = data.roles.len(),
            permissions = data.permissions.len(),
            "policy snapshot published"
        );
        Ok(())
    }

    /// Capture the current snapshot. Callers hold the returned `Arc` for
    /// the duration of one request.
    pub fn current(&self) -> Option<Arc<PolicySnapshot>> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(object: &str, action: &str) -> PermissionRow {
        PermissionRow {
            id: Uuid::new_v4(),
            object: object.to_string(),
            action: action.to_string(),
        }
    }

    fn data_with_direct_grant(subject: &str, object: &str, action: &str) -> PolicyData {
        let permission = permission(object, action);
        PolicyData {
            roles: vec![],
            permission_grants: vec![PermissionGrantRow {
                grantee: subject.to_string(),
                permission_id: permission.id,
            }],
            permissions: vec![permission],
            role_grants: vec![],
        }
    }

    #[test]
    fn direct_grant_allows_exact_pair() {
        let data = data_with_direct_grant("admin:1", "/api/admin/permission/reload", "POST");
        let snapshot = PolicySnapshot::build(&data).unwrap();
        assert!(snapshot.is_allowed("admin:1", "/api/admin/permission/reload", "POST"));
        assert!(!snapshot.is_allowed("admin:1", "/api/admin/permission/reload", "GET"));
        assert!(!snapshot.is_allowed("admin:1", "/api/admin/other", "POST"));
        assert!(!snapshot.is_allowed("admin:2", "/api/admin/permission/reload", "POST"));
    }

    #[test]
    fn role_grant_reaches_subject_through_role() {
        let role = RoleRow {
            id: Uuid::new_v4(),
            name: "admin".to_string(),
        };
        let permission = permission("/api/admin/permission/reload", "POST");
        let data = PolicyData {
            permission_grants: vec![PermissionGrantRow {
                grantee: format!("role:{}", role.id),
                permission_id: permission.id,
            }],
            role_grants: vec![RoleGrantRow {
                subject: "admin:1".to_string(),
                role_id: role.id,
            }],
            roles: vec![role],
            permissions: vec![permission],
        };
        let snapshot = PolicySnapshot::build(&data).unwrap();
        assert!(snapshot.is_allowed("admin:1", "/api/admin/permission/reload", "POST"));
        assert!(!snapshot.is_allowed("user:1", "/api/admin/permission/reload", "POST"));
    }

    #[test]
    fn prefix_grant_covers_subtree() {
        let data = data_with_direct_grant("admin:1", "/api/admin/*", "*");
        let snapshot = PolicySnapshot::build(&data).unwrap();
        assert!(snapshot.is_allowed("admin:1", "/api/admin/permission/reload", "POST"));
        assert!(snapshot.is_allowed("admin:1", "/api/admin/anything", "DELETE"));
        assert!(!snapshot.is_allowed("admin:1", "/api/user/password", "PUT"));
        // The prefix does not cover its own stem.
        assert!(!snapshot.is_allowed("admin:1", "/api/admin", "POST"));
    }

    #[test]
    fn wildcard_action_on_exact_object() {
        let data = data_with_direct_grant("user:1", "/api/user/me", "*");
        let snapshot = PolicySnapshot::build(&data).unwrap();
        assert!(snapshot.is_allowed("user:1", "/api/user/me", "GET"));
        assert!(snapshot.is_allowed("user:1", "/api/user/me", "DELETE"));
    }

    #[test]
    fn dangling_role_grant_is_rejected() {
        let data = PolicyData {
            role_grants: vec![RoleGrantRow {
                subject: "admin:1".to_string(),
                role_id: Uuid::new_v4(),
            }],
            ..Default::default()
        };
        assert!(PolicySnapshot::build(&data).is_err());
    }

    #[test]
    fn dangling_permission_grant_is_rejected() {
        let data = PolicyData {
            permission_grants: vec![PermissionGrantRow {
                grantee: "admin:1".to_string(),
                permission_id: Uuid::new_v4(),
            }],
            ..Default::default()
        };
        assert!(PolicySnapshot::build(&data).is_err());
    }

    #[test]
    fn malformed_permission_object_is_rejected() {
        let bad = permission("api/no-leading-slash", "GET");
        let data = PolicyData {
            permission_grants: vec![PermissionGrantRow {
                grantee: "user:1".to_string(),
                permission_id: bad.id,
            }],
            permissions: vec![bad],
            ..Default::default()
        };
        assert!(PolicySnapshot::build(&data).is_err());
    }

    #[test]
    fn normalize_strips_trailing_slash_only() {
        assert_eq!(normalize_object("/api/user/password/"), "/api/user/password");
        assert_eq!(normalize_object("/api/user/password"), "/api/user/password");
        assert_eq!(normalize_object("/"), "/");
    }

    struct StaticStore(PolicyData);

    #[async_trait]
    impl PolicyStore for StaticStore {
        async fn load_policy(&self) -> Result<PolicyData, AppError> {
            Ok(self.0.clone())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl PolicyStore for FailingStore {
        async fn load_policy(&self) -> Result<PolicyData, AppError> {
            Err(AppError::Database(anyhow::anyhow!("storage offline")))
        }
    }

    #[tokio::test]
    async fn cache_denies_until_first_reload() {
        let data = data_with_direct_grant("admin:1", "/api/admin/permission/reload", "POST");
        let cache = PolicyCache::new(Arc::new(StaticStore(data)));
        assert!(cache.current().is_none());

        cache.reload().await.unwrap();
        let snapshot = cache.current().unwrap();
        assert!(snapshot.is_allowed("admin:1", "/api/admin/permission/reload", "POST"));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let data = data_with_direct_grant("admin:1", "/api/admin/permission/reload", "POST");
        let cache = PolicyCache::new(Arc::new(StaticStore(data)));
        cache.reload().await.unwrap();
        let before = cache.current().unwrap();

        let failing = PolicyCache {
            store: Arc::new(FailingStore),
            current: ArcSwapOption::new(cache.current.load_full()),
        };
        assert!(failing.reload().await.is_err());
        let after = failing.current().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn in_flight_snapshot_survives_reload() {
        let data = data_with_direct_grant("admin:1", "/api/admin/permission/reload", "POST");
        let cache = PolicyCache::new(Arc::new(StaticStore(data)));
        cache.reload().await.unwrap();

        let captured = cache.current().unwrap();
        cache.reload().await.unwrap();

        // The captured snapshot still answers with its own view.
        assert!(captured.is_allowed("admin:1", "/api/admin/permission/reload", "POST"));
        assert!(!Arc::ptr_eq(&captured, &cache.current().unwrap()));
    }
}
