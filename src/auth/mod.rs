//! Authentication and authorization system.
//!
//! Everything between an HTTP request and an authorized handler body lives
//! here: credential hashing, token issuance and verification, cookie
//! plumbing, device binding, CSRF, and the role/permission graph.
//!
//! # Request lifecycle
//!
//! A browser session is carried by four cookies:
//!
//! - `access_token`: short-lived JWT, proves identity on every request
//! - `refresh_token`: long-lived opaque token, exchanged (and rotated) for a
//!   new access token when the old one expires
//! - `did`: HMAC-signed device id the refresh token is bound to
//! - `csrf`: readable token mutating requests must echo in a header
//!
//! Login verifies the password, mints all four, and records a session row
//! holding an Argon2 hash of the refresh token. Refresh presents the opaque
//! token plus the device binding, verifies it against the stored hash, and
//! rotates it so every refresh token is single-use.
//!
//! # Authorization
//!
//! Permissions are resolved through roles: users hold roles, roles grant
//! permissions, and a request's effective permission set is the union over
//! all held roles. Handlers receive the resolved [`CurrentUser`] from the
//! gate and call the [`permissions`] guards for anything beyond "logged in".
//!
//! # Modules
//!
//! - [`access`]: role and permission resolution, with a short-TTL cache
//! - [`cookies`]: cookie construction and request-side parsing
//! - [`csrf`]: double-submit CSRF guard middleware
//! - [`current_user`]: the extractor that authenticates handlers
//! - [`device`]: HMAC signing and verification of device ids
//! - [`password`]: Argon2id credential hashing over client pre-hashes
//! - [`permissions`]: authorization guards over the resolved permission set
//! - [`tokens`]: JWT access tokens and opaque refresh/CSRF token generation
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use warden::api::models::users::CurrentUser;
//! use warden::auth::permissions::require_permission;
//!
//! async fn protected_handler(user: CurrentUser) -> Result<String, Error> {
//!     require_permission(&user, "profile.read")?;
//!     Ok(format!("Hello, {}!", user.name))
//! }
//! ```
//!
//! [`CurrentUser`]: crate::api::models::users::CurrentUser

pub mod access;
pub mod cookies;
pub mod csrf;
pub mod current_user;
pub mod device;
pub mod password;
pub mod permissions;
pub mod tokens;
