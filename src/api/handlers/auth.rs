use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use chrono::Utc;

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, AuthSuccessResponse, CsrfResponse, CsrfTokenResponse, LoginRequest, LoginResponse, LogoutResponse,
            RefreshResponse, RegisterRequest, RegisterResponse, RevokeSessionRequest, SessionResponse,
        },
        users::{CurrentUser, UserResponse},
    },
    auth::{cookies, device, password, password::Argon2Params, tokens},
    db::models::{audit::AuditEventDBRequest, sessions::SessionCreateDBRequest, users::UserCreateDBRequest},
    errors::Error,
};

/// Header carrying the client-chosen device identifier on login and refresh
pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// Register a new user account
///
/// Creates the user, grants the `client` role, and sets the access cookie.
/// No session row is created; device binding happens at login.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 200, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "An account with this email already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse, Error> {
    if !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "A display name is required".to_string(),
        });
    }

    // Length rules apply to the plaintext only; a pre-hash says nothing
    // about the length of the password behind it.
    let allow_plaintext = !state.config.environment.is_production();
    let policy = &state.config.auth.password;
    if allow_plaintext && !password::is_prehash(&request.password) {
        if request.password.len() < policy.min_length {
            return Err(Error::BadRequest {
                message: format!("Password must be at least {} characters", policy.min_length),
            });
        }
        if request.password.len() > policy.max_length {
            return Err(Error::BadRequest {
                message: format!("Password must be no more than {} characters", policy.max_length),
            });
        }
    }
    let prehash = password::normalize_credential(&request.password, allow_plaintext)?;

    // Hash on a blocking thread to avoid stalling the async runtime
    let pepper = state.config.pepper()?.to_string();
    let params = Argon2Params::from(policy);
    let password_hash = tokio::task::spawn_blocking(move || password::hash_credential(&prehash, &pepper, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    // A duplicate email surfaces as a unique violation and maps to 409
    let created_user = state
        .store
        .create_user(&UserCreateDBRequest {
            email: request.email,
            name: request.name,
            password_hash: Some(password_hash),
        })
        .await?;

    state.store.assign_role(created_user.id, "client").await?;

    state
        .store
        .record_audit(&AuditEventDBRequest {
            user_id: created_user.id,
            action: "auth.register".to_string(),
            resource: "user".to_string(),
            resource_id: Some(created_user.id),
            meta: None,
        })
        .await?;

    let token = tokens::issue_access_token(created_user.id, &created_user.email, &state.config)?;
    let cookie = cookies::access_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: UserResponse::from(created_user),
        message: "Registration successful".to_string(),
    };

    Ok(RegisterResponse { auth_response, cookie })
}

/// Login with email and password
///
/// Requires a device identifier in the `X-Device-Id` header or the
/// `device_id` body field. Sets the access, refresh, and device cookies and
/// records a session row holding a hash of the refresh token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing device id"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<LoginResponse, Error> {
    let device_id = headers
        .get(DEVICE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or(request.device_id)
        .ok_or_else(|| Error::BadRequest {
            message: "A device id is required (X-Device-Id header or device_id field)".to_string(),
        })?;

    // Unknown email, missing hash, and failed verification all collapse to
    // the same response so accounts cannot be enumerated.
    let user = state
        .store
        .user_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        })?;

    let password_hash = user.password_hash.clone().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    let prehash = password::normalize_credential(&request.password, !state.config.environment.is_production())?;

    let pepper = state.config.pepper()?.to_string();
    let is_valid = tokio::task::spawn_blocking({
        let pepper = pepper.clone();
        move || password::verify_credential(&prehash, &pepper, &password_hash)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password verification task: {e}"),
    })?;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    // Fresh opaque refresh token, persisted only as an Argon2 hash
    let refresh_token = tokens::generate_refresh_token();
    let refresh_token_hash = tokio::task::spawn_blocking({
        let refresh_token = refresh_token.clone();
        let pepper = pepper.clone();
        let params = Argon2Params::from(&state.config.auth.password);
        move || password::hash_credential(&refresh_token, &pepper, Some(params))
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn refresh token hashing task: {e}"),
    })??;

    let session = state
        .store
        .create_session(&SessionCreateDBRequest {
            user_id: user.id,
            device_id: device_id.clone(),
            refresh_token_hash,
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            ip: client_ip(&headers),
            expires_at: Some(Utc::now() + state.config.auth.refresh_token_ttl),
        })
        .await?;

    let access_token = tokens::issue_access_token(user.id, &user.email, &state.config)?;
    let signed_device = device::sign_device_id(&device_id, &pepper)?;

    let cookies = vec![
        cookies::access_cookie(&access_token, &state.config),
        cookies::refresh_cookie(&refresh_token, &state.config),
        cookies::device_cookie(&signed_device, &state.config),
    ];

    state
        .store
        .record_audit(&AuditEventDBRequest {
            user_id: user.id,
            action: "auth.login".to_string(),
            resource: "session".to_string(),
            resource_id: Some(session.id),
            meta: Some(serde_json::json!({ "device_id": device_id })),
        })
        .await?;

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Login successful".to_string(),
        },
        cookies,
    })
}

/// Exchange a refresh token for fresh credentials
///
/// Requires the refresh cookie, the `X-Device-Id` header, and the signed
/// device cookie, all naming the same device. The presented token is
/// verified against the stored hashes for that device and rotated; refresh
/// tokens are single-use.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Session refreshed", body = AuthResponse),
        (status = 401, description = "Missing or invalid refresh credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<RefreshResponse, Error> {
    let refresh_token =
        cookies::request_cookie(&headers, cookies::REFRESH_TOKEN_COOKIE).ok_or(Error::Unauthenticated { message: None })?;
    let device_header = headers
        .get(DEVICE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::Unauthenticated { message: None })?;
    let device_cookie =
        cookies::request_cookie(&headers, cookies::DEVICE_COOKIE).ok_or(Error::Unauthenticated { message: None })?;

    let pepper = state.config.pepper()?.to_string();

    // The binding cookie must carry a valid signature AND name the same
    // device the client claims in the header.
    let device_id = device::verify_device_cookie(&device_cookie, &pepper)
        .filter(|bound| bound == device_header)
        .ok_or(Error::Unauthenticated { message: None })?;

    // Device ids are not unique across users, so the device lookup is only a
    // candidate set; the refresh token itself picks the session by verifying
    // against each stored hash.
    let candidates = state.store.sessions_by_device(&device_id).await?;
    let mut matched = None;
    for candidate in candidates {
        let verified = tokio::task::spawn_blocking({
            let refresh_token = refresh_token.clone();
            let pepper = pepper.clone();
            let hash = candidate.refresh_token_hash.clone();
            move || password::verify_credential(&refresh_token, &pepper, &hash)
        })
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn refresh token verification task: {e}"),
        })?;

        if verified {
            matched = Some(candidate);
            break;
        }
    }
    let session = matched.ok_or(Error::Unauthenticated { message: None })?;

    let new_refresh_token = tokens::generate_refresh_token();
    let new_hash = tokio::task::spawn_blocking({
        let new_refresh_token = new_refresh_token.clone();
        let pepper = pepper.clone();
        let params = Argon2Params::from(&state.config.auth.password);
        move || password::hash_credential(&new_refresh_token, &pepper, Some(params))
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn refresh token hashing task: {e}"),
    })??;

    // Conditional on the hash we just verified; a concurrent refresh that
    // consumed the token first wins and this request loses cleanly.
    let rotated = state.store.rotate_session(session.id, &session.refresh_token_hash, &new_hash).await?;
    if !rotated {
        return Err(Error::Unauthenticated { message: None });
    }

    // The user may have been deleted since the session was created
    let user = state
        .store
        .user_by_id(session.user_id)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    let access_token = tokens::issue_access_token(user.id, &user.email, &state.config)?;
    let signed_device = device::sign_device_id(&device_id, &pepper)?;

    let cookies = vec![
        cookies::access_cookie(&access_token, &state.config),
        cookies::refresh_cookie(&new_refresh_token, &state.config),
        cookies::device_cookie(&signed_device, &state.config),
    ];

    state
        .store
        .record_audit(&AuditEventDBRequest {
            user_id: user.id,
            action: "auth.refresh".to_string(),
            resource: "session".to_string(),
            resource_id: Some(session.id),
            meta: None,
        })
        .await?;

    Ok(RefreshResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Session refreshed".to_string(),
        },
        cookies,
    })
}

/// Logout (clear session cookies)
///
/// Clears the access and refresh cookies for this browser context. The
/// session row stays; revoking it server-side is a separate explicit call.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("cookie_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> Result<LogoutResponse, Error> {
    let cookies = vec![
        cookies::clear_cookie(cookies::ACCESS_TOKEN_COOKIE, &state.config),
        cookies::clear_cookie(cookies::REFRESH_TOKEN_COOKIE, &state.config),
    ];

    state
        .store
        .record_audit(&AuditEventDBRequest {
            user_id: user.id,
            action: "auth.logout".to_string(),
            resource: "user".to_string(),
            resource_id: Some(user.id),
            meta: None,
        })
        .await?;

    Ok(LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookies,
    })
}

/// Get the authenticated user's resolved identity
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Resolved identity", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
    ),
    security(("cookie_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(user: CurrentUser) -> Result<Json<CurrentUser>, Error> {
    Ok(Json(user))
}

/// List the caller's active sessions
#[utoipa::path(
    get,
    path = "/auth/sessions",
    tag = "auth",
    responses(
        (status = 200, description = "Active sessions, newest first", body = Vec<SessionResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("cookie_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn sessions(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<SessionResponse>>, Error> {
    let sessions = state.store.sessions_for_user(user.id).await?;

    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

/// Revoke one of the caller's sessions
///
/// Scoped to sessions the caller owns and idempotent: revoking a foreign,
/// unknown, or already-revoked id succeeds without revealing anything.
#[utoipa::path(
    post,
    path = "/auth/revoke-session",
    request_body = RevokeSessionRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Session revoked", body = AuthSuccessResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("cookie_auth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn revoke_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<RevokeSessionRequest>,
) -> Result<Json<AuthSuccessResponse>, Error> {
    state.store.revoke_session(request.session_id, user.id).await?;

    state
        .store
        .record_audit(&AuditEventDBRequest {
            user_id: user.id,
            action: "auth.session.revoke".to_string(),
            resource: "session".to_string(),
            resource_id: Some(request.session_id),
            meta: None,
        })
        .await?;

    Ok(Json(AuthSuccessResponse {
        message: "Session revoked".to_string(),
    }))
}

/// Issue a CSRF token
///
/// Sets the readable `csrf` cookie and returns the same token in the body;
/// clients echo it in the `x-csrf-token` header on every mutating request.
#[utoipa::path(
    get,
    path = "/auth/csrf",
    tag = "auth",
    responses(
        (status = 200, description = "CSRF token issued", body = CsrfResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn issue_csrf(State(state): State<AppState>) -> Result<CsrfTokenResponse, Error> {
    let token = tokens::generate_csrf_token();
    let cookie = cookies::csrf_cookie(&token, &state.config);

    Ok(CsrfTokenResponse {
        csrf_response: CsrfResponse { token },
        cookie,
    })
}

/// Client address as reported by the proxy in front of us.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
}
