//! HandyHub server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use handyhub_core::config::{Config, CONFIG_ENV};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod seed;
mod startup;

#[derive(Parser)]
#[command(name = "handyhub-server")]
#[command(about = "Booking lifecycle and conversation service for the HandyHub marketplace")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("handyhub-server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting HandyHub");

    match startup::run(config, cli.bind).await {
        Ok(()) => {
            tracing::info!("HandyHub stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "HandyHub failed");
            ExitCode::FAILURE
        }
    }
}
