//! HTTP surface: request handlers and their data models.
//!
//! - [`handlers`]: Axum handlers, one module per functional area
//! - [`models`]: request and response types, the public API contract
//!
//! # Surface
//!
//! - **Authentication** (`/auth/*`): registration, login, token refresh,
//!   logout, session listing and revocation, CSRF issuance
//! - **Admin** (`/admin/*`): endpoints gated on the `admin.panel`
//!   permission and the configured admin allowlist
//! - **Operational** (`/healthz`, `/readyz`, `/metrics`): probe and scrape
//!   targets, exempt from authentication and CSRF
//!
//! Every endpoint carries `utoipa` annotations; the rendered documentation
//! is served at `/docs`.

pub mod handlers;
pub mod models;
