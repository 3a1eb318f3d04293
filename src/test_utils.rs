//! Test utilities for integration testing (available with `test-utils` feature).

use std::{sync::Arc, time::Duration};

use axum::ServiceExt;
use axum_test::TestServer;
use tower::Layer;

use crate::{
    AppState,
    auth::csrf::csrf_middleware,
    config::{AuthConfig, Config, Environment, PasswordConfig, SecurityConfig},
    db::store::{AuthStore, MemoryStore},
};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        environment: Environment::Test,
        admin_email: "admin@example.com".to_string(),
        admin_password: Some("admin-password-123".to_string()),
        auth: AuthConfig {
            pepper: Some("test-pepper-for-testing-only".to_string()),
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(3600),
            cookie_domain: None,
            admin_emails: vec!["admin@example.com".to_string()],
            access_cache_ttl: Duration::from_secs(1),
            password: PasswordConfig {
                // Cheap cost parameters keep the many hash calls in the test
                // suite fast; production cost comes from the defaults.
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
        },
        security: SecurityConfig::default(),
        enable_metrics: false,
    }
}

pub fn create_test_state() -> AppState {
    create_test_state_with_store(Arc::new(MemoryStore::new()))
}

pub fn create_test_state_with_store(store: Arc<dyn AuthStore>) -> AppState {
    let config = create_test_config();
    let access_cache = AppState::new_access_cache(&config);

    AppState::builder().store(store).config(config).access_cache(access_cache).build()
}

pub fn create_test_state_with_config(config: Config) -> AppState {
    let access_cache = AppState::new_access_cache(&config);

    AppState::builder()
        .store(Arc::new(MemoryStore::new()))
        .config(config)
        .access_cache(access_cache)
        .build()
}

/// Browsers send all cookies in one folded `Cookie` header (RFC 6265 §5.4),
/// but the test client emits one header per jar cookie. Fold them back so the
/// application sees what a browser would send.
async fn fold_cookie_headers(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let pairs: Vec<String> = request
        .headers()
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect();
    if pairs.len() > 1 {
        if let Ok(folded) = axum::http::HeaderValue::from_str(&pairs.join("; ")) {
            request.headers_mut().remove(axum::http::header::COOKIE);
            request.headers_mut().insert(axum::http::header::COOKIE, folded);
        }
    }
    next.run(request).await
}

/// Test server with the CSRF guard layered the way [`crate::Application`]
/// layers it, and a cookie jar so multi-request flows behave like a browser.
pub fn create_test_server(state: AppState) -> TestServer {
    let router = crate::build_router(state).expect("Failed to build router");
    let middleware = axum::middleware::from_fn(csrf_middleware);
    let fold = axum::middleware::from_fn(fold_cookie_headers);
    let service = fold.layer(middleware.layer(router)).into_make_service();

    TestServer::builder()
        .save_cookies()
        .build(service)
        .expect("Failed to create test server")
}
