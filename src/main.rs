//! Loyalty web gateway.
//!
//! ```text
//!  Browser ──▶ listener ──▶ /api/* ──▶ proxy ──▶ backend service (resolved per request)
//!                      │            └──▶ data  ──▶ PostgreSQL (loyalty store)
//!                      └──▶ pages ──▶ provider composition ──▶ HTML shell
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use loyalty_gateway::config::{load_config, ConfigSource};
use loyalty_gateway::http::HttpServer;
use loyalty_gateway::observability::init_tracing;
use loyalty_gateway::store::PostgresStore;

#[derive(Parser)]
#[command(name = "loyalty-gateway", version, about = "Loyalty web gateway")]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist.
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(Some(cli.config.as_path()))?;
    init_tracing(&config.observability.log_level);

    tracing::info!("loyalty-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    if ConfigSource::of(Some(cli.config.as_path())) == ConfigSource::Defaults {
        tracing::warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }
    tracing::info!(
        config_file = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        base_path = %config.listener.base_path,
        backend_override = config.backend.override_url().unwrap_or("none"),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config.auth.jwt_secret.is_empty() {
        tracing::warn!("No JWT secret configured; logins and sessions will be rejected");
    }

    let store = PostgresStore::connect_lazy(&config.database)?;
    if let Err(e) = store.ping().await {
        tracing::warn!(error = %e, "Database not reachable yet; routes that need it will fail until it is");
    }
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let server = HttpServer::new(config, Arc::new(store.clone()))?;
    server.run(listener).await?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
