//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`UserId`]: User account identifier
//! - [`SessionId`]: Refresh session identifier
//! - [`RoleId`]: Role identifier
//! - [`PermissionId`]: Permission identifier
//!
//! Roles and permissions themselves are dynamic, database-defined strings
//! (e.g. `admin`, `user.read`), not compile-time enums; the authorization
//! layer in [`crate::auth::access`] resolves them per user.

use uuid::Uuid;

pub type UserId = Uuid;
pub type SessionId = Uuid;
pub type RoleId = Uuid;
pub type PermissionId = Uuid;

/// First 8 characters of a UUID, for log and span fields
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
