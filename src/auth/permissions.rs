//! Authorization guards.
//!
//! Handlers call these after the authentication gate has produced a
//! [`CurrentUser`]; the guards only inspect the already-resolved permission
//! set and the configuration, they never touch the store.

use crate::{
    api::models::users::CurrentUser,
    config::Config,
    errors::{Error, Result},
};

/// Require a single permission, by name.
pub fn require_permission(user: &CurrentUser, permission: &str) -> Result<()> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            permission: permission.to_string(),
        })
    }
}

/// Require at least one of the given permissions.
pub fn require_any_permission(user: &CurrentUser, permissions: &[&str]) -> Result<()> {
    if user.has_any_permission(permissions) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            permission: permissions.join(" | "),
        })
    }
}

/// Require the user's email to be on the configured admin allowlist.
///
/// The allowlist is an operational backstop layered on top of the role
/// graph. Comparison is case-insensitive because email addresses are.
pub fn require_admin_allowlist(user: &CurrentUser, config: &Config) -> Result<()> {
    let email = user.email.to_lowercase();
    if config.auth.admin_emails.iter().any(|allowed| allowed.to_lowercase() == email) {
        Ok(())
    } else {
        Err(Error::Forbidden {
            message: "Not on the admin allowlist".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn user_with_permissions(permissions: &[&str]) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "Admin@Example.com".to_string(),
            name: "Admin".to_string(),
            roles: vec!["admin".to_string()],
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_require_permission() {
        let user = user_with_permissions(&["user.read"]);
        assert!(require_permission(&user, "user.read").is_ok());

        let err = require_permission(&user, "admin.panel").unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
    }

    #[test]
    fn test_require_any_permission() {
        let user = user_with_permissions(&["profile.read"]);
        assert!(require_any_permission(&user, &["user.read", "profile.read"]).is_ok());
        assert!(require_any_permission(&user, &["user.write", "admin.panel"]).is_err());
    }

    #[test]
    fn test_admin_allowlist_is_case_insensitive() {
        let user = user_with_permissions(&["admin.panel"]);

        let mut config = Config::default();
        config.auth.admin_emails = vec!["admin@example.com".to_string()];
        assert!(require_admin_allowlist(&user, &config).is_ok());

        config.auth.admin_emails = vec!["someone-else@example.com".to_string()];
        let err = require_admin_allowlist(&user, &config).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
    }
}
