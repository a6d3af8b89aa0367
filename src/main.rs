//! Quench server binary.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quench::config::ServiceConfig;
use quench::server;

/// Code analysis service for Rust snippets.
#[derive(Parser, Debug)]
#[command(name = "quench")]
#[command(version)]
#[command(about = "Syntax checking, linting, formatting and complexity analysis over HTTP")]
struct Args {
    /// Address to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind.
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML config file (defaults to ./quench.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-client requests per minute.
    #[arg(long)]
    rate_limit: Option<u32>,

    /// Path to the lint binary invoked for lint requests.
    #[arg(long)]
    lint_command: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "quench=info,tower_http=warn".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = ServiceConfig::load(args.config.as_deref())?;

    // CLI flags win over file and environment.
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(rate_limit) = args.rate_limit {
        config.rate_limit_per_minute = rate_limit;
    }
    if let Some(lint_command) = args.lint_command {
        config.lint.command = Some(lint_command);
    }

    info!(
        host = %config.host,
        port = config.port,
        rate_limit_per_minute = config.rate_limit_per_minute,
        max_body_bytes = config.max_body_bytes,
        max_code_chars = config.max_code_chars,
        "starting quench"
    );

    server::serve(config).await
}
