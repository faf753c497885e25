//! Configuration loading from disk and the process environment.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables folded into the config at startup.
pub const ENV_BACKEND_INTERNAL_URL: &str = "BACKEND_INTERNAL_URL";
pub const ENV_BACKEND_URL: &str = "BACKEND_URL";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the loaded values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

impl ConfigSource {
    pub fn of(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path.exists() => ConfigSource::File,
            _ => ConfigSource::Defaults,
        }
    }
}

/// Load and validate configuration.
///
/// Nothing is logged here; callers report [`ConfigSource`] once tracing is
/// up. A missing file is not an error: defaults are used and the environment
/// overlay still applies.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match (path, ConfigSource::of(path)) {
        (Some(path), ConfigSource::File) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        _ => GatewayConfig::default(),
    };

    let env: HashMap<String, String> = std::env::vars().collect();
    apply_env_overrides(&mut config, &env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto a parsed config.
///
/// Takes the environment as a map so startup is the only place that touches
/// process state.
pub fn apply_env_overrides(config: &mut GatewayConfig, env: &HashMap<String, String>) {
    let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

    if let Some(v) = get(ENV_BACKEND_INTERNAL_URL) {
        config.backend.internal_url = v;
    }
    if let Some(v) = get(ENV_BACKEND_URL) {
        config.backend.url = v;
    }
    if let Some(v) = get(ENV_DATABASE_URL) {
        config.database.url = v;
    }
    if let Some(v) = get(ENV_JWT_SECRET) {
        config.auth.jwt_secret = v;
    }
    if let Some(v) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_overrides_backend_urls() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[
                (ENV_BACKEND_INTERNAL_URL, "http://web.internal:3000"),
                (ENV_BACKEND_URL, "https://shop.example.com"),
            ]),
        );
        assert_eq!(config.backend.internal_url, "http://web.internal:3000");
        assert_eq!(config.backend.url, "https://shop.example.com");
        assert_eq!(config.backend.override_url(), Some("http://web.internal:3000"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = GatewayConfig::default();
        config.backend.url = "https://from-file.example.com".into();
        apply_env_overrides(&mut config, &env(&[(ENV_BACKEND_URL, "")]));
        assert_eq!(config.backend.url, "https://from-file.example.com");
    }

    #[test]
    fn database_and_secret_from_env() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[
                (ENV_DATABASE_URL, "postgres://u:p@db:5432/loyalty"),
                (ENV_JWT_SECRET, "s3cret"),
            ]),
        );
        assert_eq!(config.database.url, "postgres://u:p@db:5432/loyalty");
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new("/definitely/not/here.toml");
        assert_eq!(ConfigSource::of(Some(path)), ConfigSource::Defaults);
        assert!(load_config(Some(path)).is_ok());
    }

    #[test]
    fn existing_file_is_the_source() {
        let path = std::env::temp_dir().join(format!("gateway-config-{}.toml", std::process::id()));
        fs::write(&path, "[listener]\nbase_path = \"/loyalty\"\n").unwrap();

        assert_eq!(ConfigSource::of(Some(path.as_path())), ConfigSource::File);
        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.listener.base_path, "/loyalty");

        fs::remove_file(&path).unwrap();
        assert_eq!(ConfigSource::of(None), ConfigSource::Defaults);
    }
}
