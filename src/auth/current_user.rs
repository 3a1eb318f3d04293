//! Request authentication gate.
//!
//! [`CurrentUser`] implements [`FromRequestParts`], so any handler that takes
//! it as an argument is authenticated: the access-token cookie is verified
//! and the user's roles and permissions are resolved before the handler body
//! runs. Handlers without the argument stay public.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::{access, cookies, tokens},
    errors::{Error, Result},
};

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = cookies::request_cookie(&parts.headers, cookies::ACCESS_TOKEN_COOKIE)
            .ok_or(Error::Unauthenticated { message: None })?;

        // Expired, malformed, and badly signed tokens already surface as
        // Unauthenticated from verification.
        let claims = tokens::verify_access_token(&token, &state.config)?;

        // A user deleted after the token was issued looks the same to the
        // caller as a bad credential.
        match access::resolve(state, claims.sub).await {
            Ok(user) => {
                debug!("authenticated {}", user.email);
                Ok(user)
            }
            Err(Error::NotFound { .. }) => Err(Error::Unauthenticated { message: None }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::FromRequestParts as _, http::request::Parts};

    use crate::{
        api::models::users::CurrentUser,
        auth::{cookies, tokens},
        db::models::users::UserCreateDBRequest,
        errors::Error,
        test_utils::create_test_state,
    };

    fn parts_with_cookie(cookie: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/auth/me")
            .header(axum::http::header::COOKIE, cookie)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_roles_and_permissions() {
        let state = create_test_state();
        let user = state
            .store
            .create_user(&UserCreateDBRequest {
                email: "gate@example.com".to_string(),
                name: "Gate".to_string(),
                password_hash: None,
            })
            .await
            .unwrap();
        state.store.assign_role(user.id, "client").await.unwrap();

        let token = tokens::issue_access_token(user.id, &user.email, &state.config).unwrap();
        let mut parts = parts_with_cookie(&format!("{}={token}", cookies::ACCESS_TOKEN_COOKIE));

        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.roles, vec!["client"]);
        assert!(current.has_permission("user.read"));
        assert!(!current.has_permission("admin.panel"));
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthenticated() {
        let state = create_test_state();
        let request = axum::http::Request::builder()
            .uri("http://localhost/auth/me")
            .body(())
            .unwrap();
        let (mut parts, _body) = request.into_parts();

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { message: None }));
    }

    #[tokio::test]
    async fn test_token_for_vanished_user_is_unauthenticated() {
        let state = create_test_state();
        let token =
            tokens::issue_access_token(uuid::Uuid::new_v4(), "ghost@example.com", &state.config).unwrap();
        let mut parts = parts_with_cookie(&format!("access_token={token}"));

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { message: None }));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        let state = create_test_state();
        let mut parts = parts_with_cookie("access_token=not-a-jwt; csrf=abc");

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }
}
