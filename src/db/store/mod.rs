//! Persistence seam for users, sessions, and the access graph.
//!
//! [`AuthStore`] is the single interface the HTTP layer talks to. Handlers
//! hold it as a trait object and never see a concrete backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  (API request handlers)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │  AuthStore   │  (Arc<dyn AuthStore> in AppState)
//! └──────┬───────┘
//!        │
//!    ┌───┴────────────┐
//!    ↓                ↓
//! ┌─────────┐  ┌─────────────┐
//! │ PgStore │  │ MemoryStore │
//! └─────────┘  └─────────────┘
//! ```
//!
//! - [`postgres::PgStore`]: SQLx/PostgreSQL, the production backend
//! - [`memory::MemoryStore`]: in-process maps, selected when no
//!   `database_url` is configured; also the backend the HTTP test suite
//!   runs against
//!
//! Semantics both implementations uphold:
//!
//! - `rotate_session` is a single conditional update matching the current
//!   hash; of two concurrent rotations of the same token, exactly one wins.
//! - `revoke_session` is scoped to the owning user and idempotent; a
//!   missing, foreign, or already-revoked id is indistinguishable from
//!   success, so session ids cannot be probed.
//! - `sessions_by_device` and `sessions_for_user` return active rows only
//!   (not revoked, not past their expiry horizon).
//! - Duplicate user emails surface as [`DbError::UniqueViolation`] from
//!   either backend.
//!
//! [`DbError::UniqueViolation`]: crate::db::errors::DbError::UniqueViolation

use crate::db::errors::Result;
use crate::db::models::{
    access::{PermissionDBResponse, RoleDBResponse},
    audit::AuditEventDBRequest,
    sessions::{SessionCreateDBRequest, SessionDBResponse},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::{PermissionId, RoleId, SessionId, UserId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence operations required by the authentication core
#[async_trait::async_trait]
pub trait AuthStore: Send + Sync {
    // Users

    /// Insert a new user
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    async fn user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>>;

    /// Replace a user's stored credential hash
    async fn set_password_hash(&self, id: UserId, password_hash: &str) -> Result<()>;

    /// Grant a role by name. Granting an already-held role is a no-op; an
    /// unknown role name is `DbError::NotFound`.
    async fn assign_role(&self, user_id: UserId, role_name: &str) -> Result<()>;

    // Access graph reads. These return raw relations; the union into a
    // permission set happens in the resolver, not here.

    async fn role_ids_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>>;

    async fn roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<RoleDBResponse>>;

    /// Role→permission edges restricted to the given roles
    async fn role_permission_edges(&self, role_ids: &[RoleId]) -> Result<Vec<(RoleId, PermissionId)>>;

    async fn permissions_by_ids(&self, ids: &[PermissionId]) -> Result<Vec<PermissionDBResponse>>;

    // Sessions

    async fn create_session(&self, request: &SessionCreateDBRequest) -> Result<SessionDBResponse>;

    /// Active sessions bound to a device id. Device ids are not unique
    /// across users, so callers verify the presented refresh token against
    /// each returned row rather than trusting the lookup.
    async fn sessions_by_device(&self, device_id: &str) -> Result<Vec<SessionDBResponse>>;

    /// Active sessions owned by a user, newest first
    async fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<SessionDBResponse>>;

    /// Atomically replace a session's refresh token hash, conditional on the
    /// stored hash still being `current_hash`. Returns `false` when no row
    /// matched (the token was already consumed or the session revoked).
    async fn rotate_session(&self, id: SessionId, current_hash: &str, new_hash: &str) -> Result<bool>;

    /// Revoke a session owned by `owner`. Idempotent.
    async fn revoke_session(&self, id: SessionId, owner: UserId) -> Result<()>;

    // Audit

    /// Append an audit event
    async fn record_audit(&self, event: &AuditEventDBRequest) -> Result<()>;
}
