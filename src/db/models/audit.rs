//! Database models for the append-only audit log.

use crate::types::UserId;
use uuid::Uuid;

/// Database request for appending an audit event.
///
/// Writes go through the store like any other operation; a failed audit
/// write fails the request that caused it.
#[derive(Debug, Clone)]
pub struct AuditEventDBRequest {
    pub user_id: UserId,
    /// What happened, e.g. `auth.login`
    pub action: String,
    /// The entity type acted on, e.g. `session`
    pub resource: String,
    pub resource_id: Option<Uuid>,
    /// Structured context, stored as JSONB
    pub meta: Option<serde_json::Value>,
}
