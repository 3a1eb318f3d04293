//! Role and permission resolution.
//!
//! [`resolve`] turns a user id into the identity the authentication gate
//! attaches to requests: the user row plus role names plus the union of
//! permission names over all held roles. Results are cached per user id for
//! a short, bounded TTL so request bursts don't re-walk the graph while
//! revocations still take effect promptly.

use std::collections::HashSet;

use tracing::instrument;

use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::models::access::PermissionDBResponse,
    errors::Error,
    types::{PermissionId, RoleId, UserId, abbrev_uuid},
};

/// Union of permission names reachable from `role_ids` through the
/// role→permission edges, deduplicated and sorted.
///
/// Pure over the three relations so the set algebra is testable without a
/// store.
pub fn permission_union(
    role_ids: &[RoleId],
    edges: &[(RoleId, PermissionId)],
    permissions: &[PermissionDBResponse],
) -> Vec<String> {
    let held: HashSet<RoleId> = role_ids.iter().copied().collect();
    let granted: HashSet<PermissionId> = edges
        .iter()
        .filter(|(role_id, _)| held.contains(role_id))
        .map(|(_, permission_id)| *permission_id)
        .collect();

    let mut names: Vec<String> = permissions
        .iter()
        .filter(|permission| granted.contains(&permission.id))
        .map(|permission| permission.name.clone())
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Resolve a user's identity, via the short-TTL cache.
pub async fn resolve(state: &AppState, user_id: UserId) -> Result<CurrentUser, Error> {
    if let Some(user) = state.access_cache.get(&user_id).await {
        return Ok(user);
    }

    let user = resolve_uncached(state, user_id).await?;
    state.access_cache.insert(user_id, user.clone()).await;

    Ok(user)
}

/// Walk the access graph for a user.
#[instrument(skip(state), fields(user_id = %abbrev_uuid(&user_id)), err)]
async fn resolve_uncached(state: &AppState, user_id: UserId) -> Result<CurrentUser, Error> {
    let store = state.store.as_ref();

    let user = store.user_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "user".to_string(),
        id: user_id.to_string(),
    })?;

    // Zero roles is not an error; it resolves to zero permissions.
    let role_ids = store.role_ids_for_user(user_id).await?;

    let mut roles: Vec<String> = store.roles_by_ids(&role_ids).await?.into_iter().map(|r| r.name).collect();
    roles.sort_unstable();

    let edges = store.role_permission_edges(&role_ids).await?;
    let permission_ids: Vec<PermissionId> = edges
        .iter()
        .map(|(_, permission_id)| *permission_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let permission_rows = store.permissions_by_ids(&permission_ids).await?;

    let permissions = permission_union(&role_ids, &edges, &permission_rows);

    Ok(CurrentUser {
        id: user.id,
        email: user.email,
        name: user.name,
        roles,
        permissions,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn permission(id: PermissionId, name: &str) -> PermissionDBResponse {
        PermissionDBResponse {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_union_deduplicates_across_roles() {
        let (role_a, role_b) = (Uuid::new_v4(), Uuid::new_v4());
        let (read, write) = (Uuid::new_v4(), Uuid::new_v4());

        let edges = vec![(role_a, read), (role_a, write), (role_b, read)];
        let rows = vec![permission(read, "user.read"), permission(write, "user.write")];

        let names = permission_union(&[role_a, role_b], &edges, &rows);
        assert_eq!(names, vec!["user.read", "user.write"]);
    }

    #[test]
    fn test_zero_roles_means_zero_permissions() {
        let role = Uuid::new_v4();
        let read = Uuid::new_v4();

        let edges = vec![(role, read)];
        let rows = vec![permission(read, "user.read")];

        assert!(permission_union(&[], &edges, &rows).is_empty());
    }

    #[test]
    fn test_edges_for_unheld_roles_are_ignored() {
        let (held, unheld) = (Uuid::new_v4(), Uuid::new_v4());
        let (read, panel) = (Uuid::new_v4(), Uuid::new_v4());

        let edges = vec![(held, read), (unheld, panel)];
        let rows = vec![permission(read, "user.read"), permission(panel, "admin.panel")];

        let names = permission_union(&[held], &edges, &rows);
        assert_eq!(names, vec!["user.read"]);
    }

    #[test]
    fn test_result_is_sorted() {
        let role = Uuid::new_v4();
        let ids: Vec<PermissionId> = (0..3).map(|_| Uuid::new_v4()).collect();

        let edges: Vec<_> = ids.iter().map(|id| (role, *id)).collect();
        let rows = vec![
            permission(ids[0], "profile.write"),
            permission(ids[1], "admin.panel"),
            permission(ids[2], "profile.read"),
        ];

        let names = permission_union(&[role], &edges, &rows);
        assert_eq!(names, vec!["admin.panel", "profile.read", "profile.write"]);
    }
}
