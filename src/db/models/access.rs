//! Database models for the role and permission graph.
//!
//! Roles and permissions are static reference data seeded at install time;
//! user → role and role → permission edges are the many-to-many tables the
//! access resolver walks.

use crate::types::{PermissionId, RoleId};
use sqlx::FromRow;

/// Database response for a role
#[derive(Debug, Clone, FromRow)]
pub struct RoleDBResponse {
    pub id: RoleId,
    pub name: String,
}

/// Database response for a permission
#[derive(Debug, Clone, FromRow)]
pub struct PermissionDBResponse {
    pub id: PermissionId,
    pub name: String,
}
