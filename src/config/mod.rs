//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (overlay process environment, once)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to the resolver, store and handlers
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; nothing reads the environment afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigSource};
pub use schema::{
    AuthConfig, BackendConfig, DatabaseConfig, GatewayConfig, ListenerConfig,
    ObservabilityConfig, TimeoutConfig,
};
