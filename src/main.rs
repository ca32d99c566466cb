//! Snack reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                 SNACK PROXY                  │
//!                          │                                              │
//!     Browser (editor)     │  ┌──────────┐   ┌────────┐   ┌───────────┐  │
//!     ─────────────────────┼─▶│request ID│──▶│  CORS  │──▶│  routing  │  │
//!                          │  │ + trace  │   │        │   │  /snack   │  │
//!                          │  └──────────┘   └────────┘   │  /api     │  │
//!                          │                              └─────┬─────┘  │
//!                          │                   ┌────────────────┴──┐     │
//!                          │                   ▼                   ▼     │
//!                          │            ┌────────────┐     ┌───────────┐ │
//!                          │            │ HTTP proxy │     │ WebSocket │ │      snack.expo.dev
//!     ◀────────────────────┼────────────│  (reqwest) │     │  tunnel   │─┼────▶ api.snack.expo.dev
//!                          │            └────────────┘     └───────────┘ │
//!                          │                                              │
//!                          │   /health ─▶ 200, no upstream contact        │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use snack_proxy::config::env::load_dotenv;
use snack_proxy::config::{load_config, EnvOverrides};
use snack_proxy::lifecycle::startup;
use snack_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "snack-proxy")]
#[command(version, about = "Reverse proxy for the Snack editor backends", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "SNACK_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before clap, so SNACK_PROXY_CONFIG may come from .env too.
    let dotenv = load_dotenv();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), &EnvOverrides::from_process_env())?;

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    logging::init(&config.observability, config.environment);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        cors_origin = %config.cors.origin_for(config.environment),
        routes = config.routes.len(),
        dotenv = ?dotenv,
        "snack-proxy starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
