//!
//! userdir server binary
//! ----------------------
//! Command-line entry point for the user directory HTTP server. Supports
//! configuration via CLI flags and environment variables.

use anyhow::{Context, Result};
use std::env;

use userdir::config::{has_flag, Config};

const USAGE: &str = "userdir Server\n\nUSAGE:\n  userdir_server [--http-port N] [--bind-host HOST] [--jwt-secret S | --jwt-secret-file PATH]\n\nOPTIONS:\n  --http-port N            HTTP API port (env: USERDIR_HTTP_PORT, default 7878)\n  --bind-host HOST         Listen address (env: USERDIR_BIND_HOST, default 0.0.0.0)\n  --jwt-secret S           Token signing secret (env: USERDIR_JWT_SECRET)\n  --jwt-secret-file PATH   Read the signing secret from a file (env: USERDIR_JWT_SECRET_FILE)\n";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter if provided
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = Config::from_env_and_args(&args).context("loading configuration")?;
    tracing::info!("Using address: http={}", config.bind_addr());
    userdir::server::run(config).await
}
