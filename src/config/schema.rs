//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the loyalty gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, mount point).
    pub listener: ListenerConfig,

    /// Backend service location.
    pub backend: BackendConfig,

    /// Session cookie and token settings.
    pub auth: AuthConfig,

    /// Loyalty database connection.
    pub database: DatabaseConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Path every route is mounted under (e.g., "/loyalty"). Empty mounts at root.
    pub base_path: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            base_path: String::new(),
        }
    }
}

/// Where backend calls are sent.
///
/// When neither override is set the base URL is derived from each request's
/// `Host` header.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Internal backend URL, checked first.
    pub internal_url: String,

    /// Explicit backend URL, checked when `internal_url` is empty.
    pub url: String,

    /// Host assumed when a request carries no `Host` header.
    pub default_host: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            internal_url: String::new(),
            url: String::new(),
            default_host: "localhost:3000".to_string(),
        }
    }
}

impl BackendConfig {
    /// The configured override, if any. Empty strings count as unset.
    pub fn override_url(&self) -> Option<&str> {
        [self.internal_url.as_str(), self.url.as_str()]
            .into_iter()
            .find(|u| !u.is_empty())
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Cookie carrying the session token.
    pub cookie_name: String,

    /// HS256 secret used to sign and verify session tokens.
    pub jwt_secret: String,

    /// Mark session cookies `Secure`.
    pub secure_cookies: bool,

    /// Lifetime of an issued session, in seconds.
    pub session_max_age_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth-token".to_string(),
            jwt_secret: String::new(),
            secure_cookies: false,
            session_max_age_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// Database pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string.
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost:5432/loyalty_db".to_string(),
            max_connections: 2,
            acquire_timeout_secs: 5,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_url_wins_over_url() {
        let backend = BackendConfig {
            internal_url: "http://internal:3000".into(),
            url: "https://public.example.com".into(),
            ..Default::default()
        };
        assert_eq!(backend.override_url(), Some("http://internal:3000"));
    }

    #[test]
    fn empty_overrides_are_unset() {
        let backend = BackendConfig::default();
        assert_eq!(backend.override_url(), None);

        let backend = BackendConfig {
            url: "https://public.example.com".into(),
            ..Default::default()
        };
        assert_eq!(backend.override_url(), Some("https://public.example.com"));
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str("[backend]\nurl = \"http://api:4000\"\n").unwrap();
        assert_eq!(config.backend.url, "http://api:4000");
        assert_eq!(config.backend.default_host, "localhost:3000");
        assert_eq!(config.auth.cookie_name, "auth-token");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.auth.session_max_age_secs, 604_800);
    }
}
