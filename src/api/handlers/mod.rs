//! Axum route handlers.
//!
//! - [`auth`]: registration, login, refresh, logout, sessions, CSRF
//! - [`admin`]: endpoints behind the admin permission and allowlist
//!
//! A handler that takes [`CurrentUser`] as an argument is authenticated by
//! the extractor in [`crate::auth::current_user`]; one without it is public.
//! Authorization beyond "logged in" happens inside the handler body through
//! the guards in [`crate::auth::permissions`].
//!
//! Handlers validate input, call the [`AuthStore`], and return
//! [`crate::errors::Error`], which maps itself to a status code and a
//! sanitized message.
//!
//! [`AuthStore`]: crate::db::store::AuthStore
//! [`CurrentUser`]: crate::api::models::users::CurrentUser

pub mod admin;
pub mod auth;
