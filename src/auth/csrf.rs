//! Double-submit CSRF guard.
//!
//! Browsers attach cookies to cross-site requests automatically, so the
//! session cookies alone cannot prove a request was made by our own pages.
//! What a cross-site attacker cannot do is read the `csrf` cookie and echo
//! it in a custom header. Mutating requests must therefore carry an
//! `x-csrf-token` header equal to the `csrf` cookie; requests that cannot
//! mutate state pass through unchecked.

use axum::{extract::Request, http::Method, middleware::Next, response::Response};

use crate::{auth::cookies, errors::Error};

/// Header clients echo the csrf cookie through
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Probe and scrape targets are exempt even for mutating methods; nothing a
/// browser renders ever posts to them.
const EXEMPT_PATHS: &[&str] = &["/healthz", "/readyz", "/metrics"];

/// Guard implementation. Returns the request untouched when it passes.
pub(crate) fn check_csrf(request: Request) -> Result<Request, Error> {
    let method = request.method();
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return Ok(request);
    }
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return Ok(request);
    }

    let cookie = cookies::request_cookie(request.headers(), cookies::CSRF_COOKIE);
    let header = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match (cookie, header) {
        (Some(cookie), Some(header)) if cookie == header => Ok(request),
        _ => Err(Error::Forbidden {
            message: "CSRF token missing or mismatched".to_string(),
        }),
    }
}

/// Middleware that rejects mutating requests whose `x-csrf-token` header
/// does not echo the csrf cookie. Applied to the whole application, outside
/// the router, so new routes cannot forget it.
pub async fn csrf_middleware(request: Request, next: Next) -> Result<Response, Error> {
    let request = check_csrf(request)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request};

    use super::*;

    fn request(method: &str, uri: &str, cookie: Option<&str>, header: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        if let Some(header) = header {
            builder = builder.header(CSRF_HEADER, header);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_safe_methods_pass_without_token() {
        for method in ["GET", "HEAD", "OPTIONS"] {
            assert!(check_csrf(request(method, "/auth/me", None, None)).is_ok());
        }
    }

    #[test]
    fn test_matching_token_passes() {
        let req = request("POST", "/auth/logout", Some("csrf=tok123"), Some("tok123"));
        assert!(check_csrf(req).is_ok());
    }

    #[test]
    fn test_mismatched_token_is_forbidden() {
        let req = request("POST", "/auth/logout", Some("csrf=tok123"), Some("other"));
        let err = check_csrf(req).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
    }

    #[test]
    fn test_missing_header_is_forbidden() {
        let req = request("POST", "/auth/logout", Some("csrf=tok123"), None);
        assert_eq!(check_csrf(req).unwrap_err().status_code().as_u16(), 403);
    }

    #[test]
    fn test_missing_cookie_is_forbidden() {
        let req = request("POST", "/auth/logout", None, Some("tok123"));
        assert_eq!(check_csrf(req).unwrap_err().status_code().as_u16(), 403);
    }

    #[test]
    fn test_exempt_paths_pass_mutating_methods() {
        for path in ["/healthz", "/readyz", "/metrics"] {
            assert!(check_csrf(request("POST", path, None, None)).is_ok());
        }
    }

    #[test]
    fn test_other_cookies_do_not_satisfy_the_guard() {
        let req = request("POST", "/auth/logout", Some("access_token=abc; refresh_token=def"), Some("abc"));
        assert_eq!(check_csrf(req).unwrap_err().status_code().as_u16(), 403);
    }
}
