//! Session cookie handling.

use axum::http::header::InvalidHeaderValue;
use axum::http::{header, HeaderMap, HeaderValue};

/// Read the named cookie from every `Cookie` header on the request.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(
    cookie_name: &str,
    token: &str,
    max_age_secs: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{cookie_name}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(cookie_name: &str, secure: bool) -> HeaderValue {
    let mut cookie = format!("{cookie_name}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("auth-token=; Path=/; Max-Age=0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth-token=abc.def.ghi; lang=en"),
        );
        assert_eq!(session_token(&headers, "auth-token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn checks_every_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("auth-token=t0k"));
        assert_eq!(session_token(&headers, "auth-token").as_deref(), Some("t0k"));
    }

    #[test]
    fn empty_or_missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers, "auth-token"), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("auth-token="));
        assert_eq!(session_token(&headers, "auth-token"), None);
    }

    #[test]
    fn issued_cookie_is_http_only() {
        let value = session_cookie("auth-token", "a.b.c", 604_800, false).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "auth-token=a.b.c; HttpOnly; SameSite=Strict; Path=/; Max-Age=604800"
        );
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let value = clear_session_cookie("auth-token", true);
        let value = value.to_str().unwrap();
        assert!(value.starts_with("auth-token=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.ends_with("Secure"));
    }
}
