//! PostgreSQL-backed [`AuthStore`] implementation.
//!
//! Queries use the runtime sqlx API with explicit binds; the schema is
//! managed by the migrations in `migrations/`.

use sqlx::PgPool;
use tracing::instrument;

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
    types::{PermissionId, RoleId, SessionId, UserId, abbrev_uuid},
};

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, user_id, device_id, refresh_token_hash, user_agent, ip, created_at, expires_at, revoked_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuthStore for PgStore {
    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn user_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    async fn user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, password_hash), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn assign_role(&self, user_id: UserId, role_name: &str) -> Result<()> {
        let role_id: Option<RoleId> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(role_name)
            .fetch_optional(&self.pool)
            .await?;

        let Some(role_id) = role_id else {
            return Err(DbError::NotFound);
        };

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn role_ids_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>> {
        let ids = sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<RoleDBResponse>> {
        let roles = sqlx::query_as::<_, RoleDBResponse>("SELECT id, name FROM roles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    #[instrument(skip(self, role_ids), fields(count = role_ids.len()), err)]
    async fn role_permission_edges(&self, role_ids: &[RoleId]) -> Result<Vec<(RoleId, PermissionId)>> {
        let edges = sqlx::query_as::<_, (RoleId, PermissionId)>(
            "SELECT role_id, permission_id FROM role_permissions WHERE role_id = ANY($1)",
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn permissions_by_ids(&self, ids: &[PermissionId]) -> Result<Vec<PermissionDBResponse>> {
        let permissions = sqlx::query_as::<_, PermissionDBResponse>("SELECT id, name FROM permissions WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create_session(&self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse> {
        let session = sqlx::query_as::<_, SessionDBResponse>(&format!(
            "INSERT INTO sessions (user_id, device_id, refresh_token_hash, user_agent, ip, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(request.user_id)
        .bind(&request.device_id)
        .bind(&request.refresh_token_hash)
        .bind(&request.user_agent)
        .bind(&request.ip)
        .bind(request.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    #[instrument(skip(self, device_id), err)]
    async fn sessions_by_device(&self, device_id: &str) -> Result<Vec<SessionDBResponse>> {
        let sessions = sqlx::query_as::<_, SessionDBResponse>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE device_id = $1 AND revoked_at IS NULL AND (expires_at IS NULL OR expires_at > NOW()) \
             ORDER BY created_at DESC"
        ))
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<SessionDBResponse>> {
        let sessions = sqlx::query_as::<_, SessionDBResponse>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE user_id = $1 AND revoked_at IS NULL AND (expires_at IS NULL OR expires_at > NOW()) \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    #[instrument(skip(self, current_hash, new_hash), fields(session_id = %abbrev_uuid(&id)), err)]
    async fn rotate_session(&self, id: SessionId, current_hash: &str, new_hash: &str) -> Result<bool> {
        // Single conditional update: of two concurrent refreshes presenting
        // the same token, only one can match the stored hash.
        let result = sqlx::query(
            "UPDATE sessions SET refresh_token_hash = $3 \
             WHERE id = $1 AND refresh_token_hash = $2 AND revoked_at IS NULL \
               AND (expires_at IS NULL OR expires_at > NOW())",
        )
        .bind(id)
        .bind(current_hash)
        .bind(new_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(session_id = %abbrev_uuid(&id), user_id = %abbrev_uuid(&owner)), err)]
    async fn revoke_session(&self, id: SessionId, owner: UserId) -> Result<()> {
        // Ownership is part of the predicate; a foreign or already-revoked id
        // affects zero rows and that is not an error.
        sqlx::query("UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self, event), fields(action = %event.action), err)]
    async fn record_audit(&self, event: &AuditEventDBRequest) -> Result<()> {
        sqlx::query("INSERT INTO audit_logs (user_id, action, resource, resource_id, meta) VALUES ($1, $2, $3, $4, $5)")
            .bind(event.user_id)
            .bind(&event.action)
            .bind(&event.resource)
            .bind(event.resource_id)
            .bind(&event.meta)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
