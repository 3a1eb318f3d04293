//! In-memory [`AuthStore`] implementation.
//!
//! Used when no `database_url` is configured and as the backend for handler
//! tests. State lives in process memory and is lost on restart, so this is
//! only suitable for development and evaluation.
//!
//! The constructor seeds the same role and permission graph as the initial
//! schema migration, so authorization behaves identically on both backends.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        models::{
            access::{PermissionDBResponse, RoleDBResponse},
            audit::AuditEventDBRequest,
            sessions::{SessionCreateDBRequest, SessionDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
        store::AuthStore,
    },
    types::{PermissionId, RoleId, SessionId, UserId},
};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, UserDBResponse>,
    sessions: HashMap<SessionId, SessionDBResponse>,
    roles: HashMap<RoleId, RoleDBResponse>,
    permissions: HashMap<PermissionId, PermissionDBResponse>,
    user_roles: HashSet<(UserId, RoleId)>,
    role_permissions: HashSet<(RoleId, PermissionId)>,
    audit: Vec<AuditEventDBRequest>,
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut inner = Inner::default();

        let mut role = |name: &str| {
            let id = Uuid::new_v4();
            inner.roles.insert(id, RoleDBResponse { id, name: name.to_string() });
            id
        };
        let admin = role("admin");
        let professional = role("professional");
        let client = role("client");

        let mut permission = |name: &str| {
            let id = Uuid::new_v4();
            inner.permissions.insert(id, PermissionDBResponse { id, name: name.to_string() });
            id
        };
        let user_read = permission("user.read");
        let user_write = permission("user.write");
        let profile_read = permission("profile.read");
        let profile_write = permission("profile.write");
        let admin_panel = permission("admin.panel");

        for permission_id in [user_read, user_write, profile_read, profile_write, admin_panel] {
            inner.role_permissions.insert((admin, permission_id));
        }
        for permission_id in [user_read, user_write, profile_read, profile_write] {
            inner.role_permissions.insert((professional, permission_id));
        }
        for permission_id in [user_read, profile_read] {
            inner.role_permissions.insert((client, permission_id));
        }

        Self { inner: RwLock::new(inner) }
    }

    /// Recorded audit events, for test assertions.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn audit_events(&self) -> Vec<AuditEventDBRequest> {
        self.inner.read().await.audit.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuthStore for MemoryStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == request.email) {
            return Err(DbError::UniqueViolation {
                constraint: Some("users_email_unique".to_string()),
                table: Some("users".to_string()),
                message: format!("duplicate email: {}", request.email),
            });
        }

        let now = Utc::now();
        let user = UserDBResponse {
            id: Uuid::new_v4(),
            email: request.email.clone(),
            name: request.name.clone(),
            password_hash: request.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.inner.read().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.get_mut(&id) {
            user.password_hash = Some(password_hash.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn assign_role(&self, user_id: UserId, role_name: &str) -> Result<()> {
        let mut inner = self.inner.write().await;

        let Some(role_id) = inner.roles.values().find(|r| r.name == role_name).map(|r| r.id) else {
            return Err(DbError::NotFound);
        };
        inner.user_roles.insert((user_id, role_id));

        Ok(())
    }

    async fn role_ids_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>> {
        let inner = self.inner.read().await;
        Ok(inner.user_roles.iter().filter(|(u, _)| *u == user_id).map(|(_, r)| *r).collect())
    }

    async fn roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<RoleDBResponse>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.roles.get(id).cloned()).collect())
    }

    async fn role_permission_edges(&self, role_ids: &[RoleId]) -> Result<Vec<(RoleId, PermissionId)>> {
        let inner = self.inner.read().await;
        Ok(inner
            .role_permissions
            .iter()
            .filter(|(role_id, _)| role_ids.contains(role_id))
            .copied()
            .collect())
    }

    async fn permissions_by_ids(&self, ids: &[PermissionId]) -> Result<Vec<PermissionDBResponse>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.permissions.get(id).cloned()).collect())
    }

    async fn create_session(&self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse> {
        let mut inner = self.inner.write().await;

        let session = SessionDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            device_id: request.device_id.clone(),
            refresh_token_hash: request.refresh_token_hash.clone(),
            user_agent: request.user_agent.clone(),
            ip: request.ip.clone(),
            created_at: Utc::now(),
            expires_at: request.expires_at,
            revoked_at: None,
        };
        inner.sessions.insert(session.id, session.clone());

        Ok(session)
    }

    async fn sessions_by_device(&self, device_id: &str) -> Result<Vec<SessionDBResponse>> {
        let inner = self.inner.read().await;
        let now = Utc::now();
        let mut sessions: Vec<SessionDBResponse> = inner
            .sessions
            .values()
            .filter(|s| s.device_id == device_id && s.is_active(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<SessionDBResponse>> {
        let inner = self.inner.read().await;
        let now = Utc::now();
        let mut sessions: Vec<SessionDBResponse> = inner
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.is_active(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn rotate_session(&self, id: SessionId, current_hash: &str, new_hash: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        match inner.sessions.get_mut(&id) {
            Some(session) if session.is_active(now) && session.refresh_token_hash == current_hash => {
                session.refresh_token_hash = new_hash.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_session(&self, id: SessionId, owner: UserId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.get_mut(&id)
            && session.user_id == owner
            && session.revoked_at.is_none()
        {
            session.revoked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn record_audit(&self, event: &AuditEventDBRequest) -> Result<()> {
        self.inner.write().await.audit.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn user_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            name: "Test User".to_string(),
            password_hash: Some("$argon2id$fake".to_string()),
        }
    }

    fn session_request(user_id: UserId, device_id: &str, hash: &str) -> SessionCreateDBRequest {
        SessionCreateDBRequest {
            user_id,
            device_id: device_id.to_string(),
            refresh_token_hash: hash.to_string(),
            user_agent: None,
            ip: None,
            expires_at: Some(Utc::now() + Duration::days(30)),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_email_is_unique_violation() {
        let store = MemoryStore::new();
        store.create_user(&user_request("a@example.com")).await.unwrap();

        let err = store.create_user(&user_request("a@example.com")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref constraint, .. } if constraint.as_deref() == Some("users_email_unique")
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_seeded_access_graph() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_request("client@example.com")).await.unwrap();
        store.assign_role(user.id, "client").await.unwrap();

        let role_ids = store.role_ids_for_user(user.id).await.unwrap();
        assert_eq!(role_ids.len(), 1);
        let roles = store.roles_by_ids(&role_ids).await.unwrap();
        assert_eq!(roles[0].name, "client");

        let edges = store.role_permission_edges(&role_ids).await.unwrap();
        let permission_ids: Vec<PermissionId> = edges.iter().map(|(_, permission_id)| *permission_id).collect();
        let mut names: Vec<String> = store
            .permissions_by_ids(&permission_ids)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["profile.read", "user.read"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_admin_role_has_all_permissions() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_request("admin@example.com")).await.unwrap();
        store.assign_role(user.id, "admin").await.unwrap();

        let role_ids = store.role_ids_for_user(user.id).await.unwrap();
        let edges = store.role_permission_edges(&role_ids).await.unwrap();
        assert_eq!(edges.len(), 5);
    }

    #[test_log::test(tokio::test)]
    async fn test_assign_unknown_role() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_request("a@example.com")).await.unwrap();

        let err = store.assign_role(user.id, "superuser").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[test_log::test(tokio::test)]
    async fn test_rotate_session_is_single_use() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_request("a@example.com")).await.unwrap();
        let session = store.create_session(&session_request(user.id, "device-1", "hash-a")).await.unwrap();

        // First presenter wins, second presenter of the same hash loses.
        assert!(store.rotate_session(session.id, "hash-a", "hash-b").await.unwrap());
        assert!(!store.rotate_session(session.id, "hash-a", "hash-c").await.unwrap());
        assert!(store.rotate_session(session.id, "hash-b", "hash-c").await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_rotate_revoked_session_fails() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_request("a@example.com")).await.unwrap();
        let session = store.create_session(&session_request(user.id, "device-1", "hash-a")).await.unwrap();

        store.revoke_session(session.id, user.id).await.unwrap();
        assert!(!store.rotate_session(session.id, "hash-a", "hash-b").await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_revoke_is_idempotent_and_ownership_scoped() {
        let store = MemoryStore::new();
        let owner = store.create_user(&user_request("owner@example.com")).await.unwrap();
        let other = store.create_user(&user_request("other@example.com")).await.unwrap();
        let session = store.create_session(&session_request(owner.id, "device-1", "hash-a")).await.unwrap();

        // A non-owner revocation succeeds without touching the session.
        store.revoke_session(session.id, other.id).await.unwrap();
        assert_eq!(store.sessions_for_user(owner.id).await.unwrap().len(), 1);

        store.revoke_session(session.id, owner.id).await.unwrap();
        assert_eq!(store.sessions_for_user(owner.id).await.unwrap().len(), 0);

        // Revoking again is still fine.
        store.revoke_session(session.id, owner.id).await.unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn test_listings_exclude_expired_and_revoked() {
        let store = MemoryStore::new();
        let user = store.create_user(&user_request("a@example.com")).await.unwrap();

        let active = store.create_session(&session_request(user.id, "device-1", "hash-a")).await.unwrap();
        let revoked = store.create_session(&session_request(user.id, "device-2", "hash-b")).await.unwrap();
        store.revoke_session(revoked.id, user.id).await.unwrap();

        let mut expired = session_request(user.id, "device-3", "hash-c");
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        store.create_session(&expired).await.unwrap();

        let sessions = store.sessions_for_user(user.id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, active.id);

        assert_eq!(store.sessions_by_device("device-1").await.unwrap().len(), 1);
        assert_eq!(store.sessions_by_device("device-2").await.unwrap().len(), 0);
    }
}
