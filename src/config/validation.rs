//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the backend override is an absolute http(s) URL
//! - Validate value ranges (timeouts > 0, pool size > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("base path '{0}' must start with '/' and not end with '/'")]
    BasePath(String),

    #[error("backend override '{0}' is not an absolute http(s) URL")]
    BackendOverride(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let base = &config.listener.base_path;
    if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
        errors.push(ValidationError::BasePath(base.clone()));
    }

    for candidate in [&config.backend.internal_url, &config.backend.url] {
        if !candidate.is_empty() && !is_http_url(candidate) {
            errors.push(ValidationError::BackendOverride(candidate.clone()));
        }
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::Zero("database.max_connections"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.auth.session_max_age_secs == 0 {
        errors.push(ValidationError::Zero("auth.session_max_age_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nope".into();
        config.listener.base_path = "loyalty/".into();
        config.backend.url = "ftp://files.example.com".into();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero("timeouts.request_secs")));
    }

    #[test]
    fn accepts_https_override_and_base_path() {
        let mut config = GatewayConfig::default();
        config.backend.internal_url = "https://backend.internal".into();
        config.listener.base_path = "/loyalty".into();
        assert!(validate_config(&config).is_ok());
    }
}
