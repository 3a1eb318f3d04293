//! # warden: Authentication and Access Control Service
//!
//! `warden` is a self-hostable authentication, session, and authorization service for
//! browser-facing applications. It owns the full credential lifecycle: registration and login
//! with peppered Argon2id password hashing, short-lived JWT access tokens, rotating single-use
//! refresh tokens bound to a device, and role-based authorization resolved from a
//! database-defined permission graph.
//!
//! ## Overview
//!
//! Web applications repeatedly rebuild the same authentication plumbing, and the details are
//! easy to get wrong: tokens that outlive revocations, refresh tokens that can be replayed,
//! cookies readable from injected scripts, and login responses that leak which emails have
//! accounts. This crate packages those decisions behind a small HTTP API so application
//! services can stay stateless and delegate identity entirely.
//!
//! ### What It Does
//!
//! Clients authenticate once with an email and a client-side SHA-256 pre-hash of their
//! password. The service verifies the credential against a peppered Argon2id hash, then issues
//! three cookies: a short-lived JWT access token, an opaque single-use refresh token, and a
//! signed device binding. Subsequent requests authenticate with the access cookie alone; when
//! it expires, the refresh endpoint rotates the refresh token and re-issues all three cookies,
//! provided the caller still presents the same device binding. Every mutating route sits
//! behind a double-submit CSRF guard, and session rows can be listed and revoked per device.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for persistence. Without a configured `database_url` it falls back to an
//! in-process store, which keeps development and the test suite free of external services.
//!
//! ### Request Flow
//!
//! A request to a protected endpoint carries the `access_token` cookie. The authentication
//! gate verifies the JWT signature and expiry, then resolves the user's roles and the union of
//! their permissions through a cache whose TTL is bounded by configuration, so revocations
//! take effect within a minute. Handlers receive the resolved [`CurrentUser`] and perform
//! their own permission checks; admin endpoints additionally require the caller's email to be
//! on a configured allowlist.
//!
//! The refresh flow never trusts the client's claimed session: the presented refresh token is
//! verified against the stored Argon2 hashes of the device's active sessions, and rotation is
//! conditional on the hash that was just verified, so a concurrently-consumed token loses
//! cleanly rather than forking the session.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the authentication surface under `/auth/*` and the
//! gated admin surface under `/admin/*`, with interactive OpenAPI documentation at `/docs`.
//!
//! The **authentication layer** ([`auth`]) holds the hashing, token, cookie, device-binding,
//! CSRF, and permission primitives. Each is a small module with no HTTP dependencies beyond
//! header types, so the security-sensitive logic is unit-testable in isolation.
//!
//! The **database layer** ([`db`]) abstracts persistence behind the
//! [`AuthStore`](db::store::AuthStore) trait with PostgreSQL and in-memory implementations.
//! Schema lives in `migrations/` and is applied automatically on startup.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use warden::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = warden::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     warden::telemetry::init_telemetry()?;
//!
//!     // Serve until Ctrl+C, then drain in-flight requests
//!     Application::new(config)
//!         .await?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! With a configured `database_url` the application runs migrations on startup; they can also
//! be applied manually:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! warden::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router, ServiceExt,
    http::HeaderValue,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use moka::future::Cache;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    api::models::users::CurrentUser,
    auth::{csrf::csrf_middleware, password, password::Argon2Params},
    config::CorsOrigin,
    db::{
        models::users::UserCreateDBRequest,
        store::{AuthStore, MemoryStore, PgStore},
    },
    openapi::ApiDoc,
};

pub use config::Config;
pub use types::{PermissionId, RoleId, SessionId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `store`: Persistence backend (PostgreSQL or in-memory)
/// - `config`: Application configuration loaded from environment/files
/// - `access_cache`: Resolved identity cache keyed by user id
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .store(store)
///     .config(config)
///     .access_cache(AppState::new_access_cache(&config))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn AuthStore>,
    pub config: Config,
    pub access_cache: Cache<UserId, CurrentUser>,
}

impl AppState {
    /// Cache for resolved identities. The TTL comes from configuration and
    /// is capped by [`Config::validate`] so revocations propagate promptly.
    pub fn new_access_cache(config: &Config) -> Cache<UserId, CurrentUser> {
        Cache::builder()
            .max_capacity(10_000)
            .time_to_live(config.auth.access_cache_ttl)
            .build()
    }
}

/// Get the warden database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the user on first call and updates the password on
/// subsequent calls when one is provided. The account is granted the `admin`
/// role either way. Called during application startup so an operator always
/// has a way in.
///
/// The operator-supplied password arrives in plaintext through configuration,
/// so the client pre-hash is derived here before peppered hashing.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    store: &dyn AuthStore,
    config: &Config,
) -> Result<UserId, errors::Error> {
    let password_hash = match password {
        Some(secret) => {
            let prehash = password::prehash(secret);
            let pepper = config.pepper()?.to_string();
            let params = Argon2Params::from(&config.auth.password);
            let hash = tokio::task::spawn_blocking(move || password::hash_credential(&prehash, &pepper, Some(params)))
                .await
                .map_err(|e| errors::Error::Internal {
                    operation: format!("spawn password hashing task: {e}"),
                })??;
            Some(hash)
        }
        None => None,
    };

    let user_id = match store.user_by_email(email).await? {
        Some(existing) => {
            if let Some(hash) = password_hash {
                store.set_password_hash(existing.id, &hash).await?;
            }
            existing.id
        }
        None => {
            info!("Creating initial admin user {email}");
            let created = store
                .create_user(&UserCreateDBRequest {
                    email: email.to_string(),
                    name: "Administrator".to_string(),
                    password_hash,
                })
                .await?;
            created.id
        }
    };

    store.assign_role(user_id, "admin").await?;

    Ok(user_id)
}

/// Build the CORS layer from the configured origins.
///
/// Credentials support is required for cookie auth, and the custom CSRF and
/// device id headers must be explicitly allowed for browsers to send them.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.security.cors.allow_credentials)
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(auth::csrf::CSRF_HEADER),
            axum::http::HeaderName::from_static(api::handlers::auth::DEVICE_ID_HEADER),
        ])
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST]);

    if let Some(max_age) = config.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// This constructs the complete Axum router with:
/// - Authentication routes (`/auth/*`)
/// - Admin routes (`/admin/*`)
/// - Operational endpoints (`/healthz`, `/readyz`, optional `/metrics`)
/// - Interactive API documentation at `/docs`
/// - CORS configuration
/// - Tracing middleware
///
/// The CSRF guard is not part of the router; [`Application::serve`] layers
/// it outside path matching so no mutating route can bypass it.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;
    let enable_metrics = state.config.enable_metrics;

    let auth_routes = Router::new()
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/refresh", post(api::handlers::auth::refresh))
        .route("/auth/logout", post(api::handlers::auth::logout))
        .route("/auth/me", get(api::handlers::auth::me))
        .route("/auth/sessions", get(api::handlers::auth::sessions))
        .route("/auth/revoke-session", post(api::handlers::auth::revoke_session))
        .route("/auth/csrf", get(api::handlers::auth::issue_csrf))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin/ping", get(api::handlers::admin::ping))
        .with_state(state);

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/readyz", get(|| async { "OK" }))
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let mut router = router.layer(cors_layer);

    if enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Request/response tracing wraps everything, metrics included
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router and server lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects the store, runs migrations,
///    and bootstraps the initial admin user
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles requests
///    until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Connect the store, apply migrations, bootstrap the admin user, and
    /// assemble the router
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting warden with configuration: {:#?}", config);

        let store: Arc<dyn AuthStore> = match config.database_url.as_deref() {
            Some(url) => {
                info!("Using PostgreSQL store");
                let pool = PgPool::connect(url).await?;
                migrator().run(&pool).await?;
                Arc::new(PgStore::new(pool))
            }
            None => {
                warn!("No database_url configured: using the in-memory store. Accounts and sessions are lost on restart.");
                Arc::new(MemoryStore::new())
            }
        };

        // Ensure an operator can always log in
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), store.as_ref(), &config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {e}"))?;

        let access_cache = AppState::new_access_cache(&config);
        let state = AppState::builder().store(store).config(config.clone()).access_cache(access_cache).build();

        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Turn the fully wired application into an in-process test server
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        // Same CSRF layering as `serve`
        let middleware = axum::middleware::from_fn(csrf_middleware);
        let service = middleware.layer(self.router).into_make_service();
        axum_test::TestServer::builder()
            .save_cookies()
            .build(service)
            .expect("Failed to create test server")
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("warden listening on http://{}", bind_addr);

        // Apply the CSRF guard before path matching
        let middleware = axum::middleware::from_fn(csrf_middleware);
        let service = middleware.layer(self.router);

        axum::serve(listener, service.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
