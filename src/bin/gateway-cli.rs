use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use loyalty_gateway::backend::{BackendClient, BackendResolver, CallOptions};
use loyalty_gateway::composition::{compose_page, conditional_layout, match_public_route};
use loyalty_gateway::config::load_config;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspect how the loyalty gateway resolves and composes requests", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the backend base URL a request with this Host header would use
    Resolve {
        #[arg(long)]
        host: Option<String>,
    },
    /// Print the provider stack and chrome a page path would get
    Stack { path: String },
    /// Call a backend endpoint the way the gateway would
    Call {
        endpoint: String,
        #[arg(long)]
        host: Option<String>,
        /// JSON body; switches the call to POST
        #[arg(long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(Some(cli.config.as_path()))?;

    match cli.command {
        Commands::Resolve { host } => {
            let resolver = BackendResolver::new(&config.backend);
            println!("{}", resolver.resolve_host(host.as_deref()));
        }
        Commands::Stack { path } => {
            let route = match_public_route(Some(&path))
                .map(|r| format!("{} ({:?})", r.prefix, r.kind))
                .unwrap_or_else(|| "none".to_string());
            println!("public route: {route}");
            println!("stack:        {}", compose_page(Some(&path)));
            println!("chrome:       {:?}", conditional_layout(&path));
        }
        Commands::Call { endpoint, host, data } => {
            let client = BackendClient::new(BackendResolver::new(&config.backend))?;
            let backend = client.for_host(host.as_deref());
            let options = match data {
                Some(raw) => CallOptions::post_json(&serde_json::from_str::<Value>(&raw)?)?,
                None => CallOptions::get(),
            };
            eprintln!("→ {}{}", backend.base_url(), endpoint);
            let res = backend.call(&endpoint, options).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: backend returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
