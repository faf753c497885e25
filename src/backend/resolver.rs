//! Backend base URL resolution.
//!
//! # Responsibilities
//! - Prefer the configured override, verbatim
//! - Otherwise derive `scheme://host` from the request's Host header
//! - Pick `http` for localhost, `https` for everything else

use std::fmt;

use axum::http::{header, HeaderMap};

use crate::config::BackendConfig;

/// Host assumed when the request carries none.
pub const DEFAULT_HOST: &str = "localhost:3000";

/// Base URL of the backend service for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl(String);

impl BackendUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append an endpoint path (which starts with `/`).
    pub fn join(&self, endpoint: &str) -> String {
        format!("{}{}", self.0, endpoint)
    }
}

impl fmt::Display for BackendUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the backend base URL from an optional override and Host header.
pub fn resolve_backend_url(override_url: Option<&str>, host: Option<&str>) -> BackendUrl {
    resolve_with_default(override_url, host, DEFAULT_HOST)
}

fn resolve_with_default(override_url: Option<&str>, host: Option<&str>, default_host: &str) -> BackendUrl {
    if let Some(url) = override_url.filter(|u| !u.is_empty()) {
        return BackendUrl(url.to_string());
    }

    let host = host.filter(|h| !h.is_empty()).unwrap_or(default_host);
    let scheme = if host.contains("localhost") { "http" } else { "https" };
    BackendUrl(format!("{scheme}://{host}"))
}

/// Resolver bound to the startup configuration.
#[derive(Debug, Clone)]
pub struct BackendResolver {
    override_url: Option<String>,
    default_host: String,
}

impl BackendResolver {
    pub fn new(config: &BackendConfig) -> Self {
        let default_host = if config.default_host.is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            config.default_host.clone()
        };
        Self {
            override_url: config.override_url().map(str::to_string),
            default_host,
        }
    }

    pub fn override_url(&self) -> Option<&str> {
        self.override_url.as_deref()
    }

    /// Resolve against an inbound request's headers.
    pub fn resolve(&self, headers: &HeaderMap) -> BackendUrl {
        let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
        self.resolve_host(host)
    }

    pub fn resolve_host(&self, host: Option<&str>) -> BackendUrl {
        resolve_with_default(self.override_url.as_deref(), host, &self.default_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn public_host_uses_https() {
        let url = resolve_backend_url(None, Some("myapp.herokuapp.com"));
        assert_eq!(url.as_str(), "https://myapp.herokuapp.com");
    }

    #[test]
    fn localhost_uses_http() {
        assert_eq!(
            resolve_backend_url(None, Some("localhost:3000")).as_str(),
            "http://localhost:3000"
        );
        assert_eq!(
            resolve_backend_url(None, Some("api.localhost.test")).as_str(),
            "http://api.localhost.test"
        );
    }

    #[test]
    fn scheme_follows_localhost_substring() {
        for host in ["127.0.0.1:3000", "shop.example.com", "LOCALHOST:3000", "10.0.0.5"] {
            assert!(resolve_backend_url(None, Some(host)).as_str().starts_with("https://"), "{host}");
        }
        for host in ["localhost", "localhost:8080", "my-localhost.dev"] {
            assert!(resolve_backend_url(None, Some(host)).as_str().starts_with("http://"), "{host}");
        }
    }

    #[test]
    fn missing_or_empty_host_defaults_to_localhost() {
        assert_eq!(resolve_backend_url(None, None).as_str(), "http://localhost:3000");
        assert_eq!(resolve_backend_url(None, Some("")).as_str(), "http://localhost:3000");
    }

    #[test]
    fn override_is_returned_verbatim() {
        let url = resolve_backend_url(Some("http://backend.internal:8080/"), Some("myapp.herokuapp.com"));
        assert_eq!(url.as_str(), "http://backend.internal:8080/");
    }

    #[test]
    fn empty_override_is_ignored() {
        let url = resolve_backend_url(Some(""), Some("shop.example.com"));
        assert_eq!(url.as_str(), "https://shop.example.com");
    }

    #[test]
    fn resolver_reads_host_header() {
        let resolver = BackendResolver::new(&BackendConfig::default());
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("loyalty.example.com"));
        assert_eq!(resolver.resolve(&headers).as_str(), "https://loyalty.example.com");
        assert_eq!(resolver.resolve(&HeaderMap::new()).as_str(), "http://localhost:3000");
    }

    #[test]
    fn resolver_prefers_configured_override() {
        let config = BackendConfig {
            url: "https://api.example.com".into(),
            ..Default::default()
        };
        let resolver = BackendResolver::new(&config);
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3001"));
        assert_eq!(resolver.resolve(&headers).as_str(), "https://api.example.com");
    }

    #[test]
    fn join_appends_endpoint() {
        let url = resolve_backend_url(None, Some("localhost:3000"));
        assert_eq!(url.join("/api/locations"), "http://localhost:3000/api/locations");
    }
}
