//! API request/response models for authentication and sessions.

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::users::UserResponse,
    db::models::sessions::SessionDBResponse,
    types::SessionId,
};

/// Request to register a new user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Email address (must be unique)
    pub email: String,
    /// Client pre-hash of the password (SHA-256, 64 hex characters).
    /// Outside production a plaintext password is accepted and pre-hashed
    /// server-side for developer convenience.
    pub password: String,
    /// Display name
    pub name: String,
}

/// Request to login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Client pre-hash of the password (see [`RegisterRequest::password`])
    pub password: String,
    /// Device identifier fallback, used when the `X-Device-Id` header is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// Request to revoke one of the caller's sessions
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeSessionRequest {
    #[schema(value_type = String, format = "uuid")]
    pub session_id: SessionId,
}

/// Response after successful login or registration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// User information
    pub user: UserResponse,
    /// Success message
    pub message: String,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// CSRF token, also set as the `csrf` cookie
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CsrfResponse {
    pub token: String,
}

/// A session as shown to its owner.
///
/// The refresh token hash never leaves the store layer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SessionId,
    pub device_id: String,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<SessionDBResponse> for SessionResponse {
    fn from(db: SessionDBResponse) -> Self {
        Self {
            id: db.id,
            device_id: db.device_id,
            user_agent: db.user_agent,
            ip: db.ip,
            created_at: db.created_at,
            expires_at: db.expires_at,
        }
    }
}

// Response models that implement IntoResponse for cleaner handler code

fn with_cookies<T: Serialize>(cookies: &[String], body: T) -> Response {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        headers.append(header::SET_COOKIE, cookie.parse().unwrap());
    }
    (StatusCode::OK, headers, Json(body)).into_response()
}

/// Structured response for successful registration (sets the access cookie)
pub struct RegisterResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        with_cookies(&[self.cookie], self.auth_response)
    }
}

/// Structured response for successful login (sets access, refresh, and
/// device cookies)
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookies: Vec<String>,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        with_cookies(&self.cookies, self.auth_response)
    }
}

/// Structured response for a successful refresh (resets access, refresh, and
/// device cookies)
pub struct RefreshResponse {
    pub auth_response: AuthResponse,
    pub cookies: Vec<String>,
}

impl IntoResponse for RefreshResponse {
    fn into_response(self) -> Response {
        with_cookies(&self.cookies, self.auth_response)
    }
}

/// Structured response for logout (clears the access and refresh cookies)
pub struct LogoutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookies: Vec<String>,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        with_cookies(&self.cookies, self.auth_response)
    }
}

/// Structured response for CSRF issuance (sets the readable `csrf` cookie)
pub struct CsrfTokenResponse {
    pub csrf_response: CsrfResponse,
    pub cookie: String,
}

impl IntoResponse for CsrfTokenResponse {
    fn into_response(self) -> Response {
        with_cookies(&[self.cookie], self.csrf_response)
    }
}
