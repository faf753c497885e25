//! Loyalty web gateway library.
//!
//! Serves the loyalty app's pages and JSON API: backend calls are forwarded
//! to the base URL resolved for each request, database reads go through the
//! loyalty store, and every page is wrapped in the provider stack chosen for
//! its path.

pub mod auth;
pub mod backend;
pub mod composition;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::GatewayConfig;
pub use http::HttpServer;
