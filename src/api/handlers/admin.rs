use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{admin::AdminPingResponse, users::CurrentUser},
    auth::permissions,
    errors::Error,
};

/// Admin surface liveness check
///
/// Gated twice: the caller's email must be on the configured admin allowlist
/// and the caller must hold the `admin.panel` permission. A role grant alone
/// is not enough to reach this surface.
#[utoipa::path(
    get,
    path = "/admin/ping",
    tag = "admin",
    responses(
        (status = 200, description = "Caller may use the admin surface", body = AdminPingResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an allowlisted admin"),
    ),
    security(("cookie_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn ping(State(state): State<AppState>, user: CurrentUser) -> Result<Json<AdminPingResponse>, Error> {
    permissions::require_admin_allowlist(&user, &state.config)?;
    permissions::require_permission(&user, "admin.panel")?;

    Ok(Json(AdminPingResponse { message: "pong".to_string() }))
}
