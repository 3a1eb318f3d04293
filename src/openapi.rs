//! OpenAPI documentation configuration.
//!
//! The generated spec is served interactively at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Cookie security scheme shared by all authenticated endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "cookie_auth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "access_token",
                    "Short-lived JWT set by `/auth/register`, `/auth/login`, and `/auth/refresh`.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "warden",
        description = "Cookie-based authentication, session, and authorization service."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::refresh,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::auth::sessions,
        api::handlers::auth::revoke_session,
        api::handlers::auth::issue_csrf,
        api::handlers::admin::ping,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::RevokeSessionRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::auth::CsrfResponse,
            api::models::auth::SessionResponse,
            api::models::admin::AdminPingResponse,
            api::models::users::UserResponse,
            api::models::users::CurrentUser,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login, token refresh, and session management"),
        (name = "admin", description = "Endpoints behind the admin allowlist and permission"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_every_route() {
        let doc = ApiDoc::openapi();

        for path in [
            "/auth/register",
            "/auth/login",
            "/auth/refresh",
            "/auth/logout",
            "/auth/me",
            "/auth/sessions",
            "/auth/revoke-session",
            "/auth/csrf",
            "/admin/ping",
        ] {
            assert!(doc.paths.paths.contains_key(path), "undocumented path: {path}");
        }
    }
}
