//! Auth cookie names, construction, and request-side parsing.
//!
//! All cookies share `Path=/` and `SameSite=Strict`. `Secure` is set
//! everywhere except development so local HTTP still works, and `Domain` is
//! added only when configured. The CSRF cookie is the only one readable by
//! client scripts; everything else is HttpOnly.

use std::time::Duration;

use axum::http::HeaderMap;

use crate::config::Config;

/// Short-lived signed identity token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Opaque long-lived rotation token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// Double-submit CSRF value.
pub const CSRF_COOKIE: &str = "csrf";
/// Signed device id binding.
pub const DEVICE_COOKIE: &str = "did";

/// Build a Set-Cookie value with the shared attribute set.
pub fn build_cookie(name: &str, value: &str, http_only: bool, max_age: Option<Duration>, config: &Config) -> String {
    let mut cookie = format!("{name}={value}; Path=/");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if !config.environment.is_development() {
        cookie.push_str("; Secure");
    }
    cookie.push_str("; SameSite=Strict");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age.as_secs()));
    }
    if let Some(domain) = &config.auth.cookie_domain {
        cookie.push_str(&format!("; Domain={domain}"));
    }

    cookie
}

/// An expired Set-Cookie value that clears `name`.
pub fn clear_cookie(name: &str, config: &Config) -> String {
    build_cookie(name, "", true, Some(Duration::ZERO), config)
}

pub fn access_cookie(token: &str, config: &Config) -> String {
    build_cookie(ACCESS_TOKEN_COOKIE, token, true, Some(config.auth.access_token_ttl), config)
}

pub fn refresh_cookie(token: &str, config: &Config) -> String {
    build_cookie(REFRESH_TOKEN_COOKIE, token, true, Some(config.auth.refresh_token_ttl), config)
}

/// The device cookie lives as long as the refresh session it validates.
pub fn device_cookie(signed_device_id: &str, config: &Config) -> String {
    build_cookie(DEVICE_COOKIE, signed_device_id, true, Some(config.auth.refresh_token_ttl), config)
}

/// Session-scoped and readable by the client, which echoes it back in the
/// `x-csrf-token` header.
pub fn csrf_cookie(token: &str, config: &Config) -> String {
    build_cookie(CSRF_COOKIE, token, false, None, config)
}

/// Read a cookie value from the request headers.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_str = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((cookie_name, value)) = cookie.split_once('=') {
            if cookie_name == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use axum::http::header::COOKIE;

    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_development_cookies_are_not_secure() {
        let config = Config::default();

        let cookie = access_cookie("tok", &config);
        assert!(cookie.starts_with("access_token=tok; "));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Domain"));
    }

    #[test]
    fn test_production_cookies_are_secure() {
        let mut config = Config::default();
        config.environment = Environment::Production;
        config.auth.cookie_domain = Some("example.com".to_string());

        let cookie = refresh_cookie("tok", &config);
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Domain=example.com"));
        assert!(cookie.contains(&format!("Max-Age={}", config.auth.refresh_token_ttl.as_secs())));
    }

    #[test]
    fn test_csrf_cookie_is_readable_and_session_scoped() {
        let config = Config::default();

        let cookie = csrf_cookie("tok", &config);
        assert!(!cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Max-Age"));
    }

    #[test]
    fn test_clear_cookie() {
        let config = Config::default();

        let cookie = clear_cookie(ACCESS_TOKEN_COOKIE, &config);
        assert!(cookie.starts_with("access_token=; "));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_request_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "a=1; access_token=abc.def; csrf=xyz".parse().unwrap());

        assert_eq!(request_cookie(&headers, "access_token").as_deref(), Some("abc.def"));
        assert_eq!(request_cookie(&headers, "csrf").as_deref(), Some("xyz"));
        assert_eq!(request_cookie(&headers, "refresh_token"), None);

        // Values may contain '='; only the first one splits name from value
        headers.insert(COOKIE, "did=dev.1=2".parse().unwrap());
        assert_eq!(request_cookie(&headers, "did").as_deref(), Some("dev.1=2"));

        assert_eq!(request_cookie(&HeaderMap::new(), "access_token"), None);
    }
}
