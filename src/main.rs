//! social-store
//!
//! Data access layer of the social-sharing backend, run as a standalone
//! process for operations: it opens the database session, keeps it
//! healthy, and closes it on shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                        social-store                           │
//!   │                                                              │
//!   │  CRUD services ──▶ DataSession ──────▶ PgDriver ──▶ Postgres  │
//!   │                    │  execute_with_retry / run                │
//!   │                    │  state: Connected ←→ Degraded            │
//!   │                    ▼                                          │
//!   │              health probe (SELECT 1 every 30s)                │
//!   │                                                              │
//!   │  ┌────────────────────────────────────────────────────────┐  │
//!   │  │ config │ observability │ resilience │ lifecycle         │  │
//!   │  └────────────────────────────────────────────────────────┘  │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use social_store::config::{load_config, validate_config, AppConfig, ConfigError};
use social_store::lifecycle::signals::wait_for_shutdown_signal;
use social_store::lifecycle::startup::bootstrap;
use social_store::observability::{logging, metrics};
use social_store::SessionState;

#[derive(Parser)]
#[command(name = "social-store")]
#[command(about = "Resilient database session for the social backend", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "SOCIAL_STORE_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL, overriding the configuration file.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep the session open until SIGINT/SIGTERM (default)
    Serve,
    /// Connect once, print the session status as JSON, and exit
    Check,
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = &cli.database_url {
        config.database.url = url.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("social-store v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let session = bootstrap(&config).await;

    let code = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            wait_for_shutdown_signal().await;
            ExitCode::SUCCESS
        }
        Commands::Check => {
            let status = session.status();
            match serde_json::to_string_pretty(&status) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::error!(error = %e, "Failed to render status"),
            }
            if status.state == SessionState::Connected {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    };

    session.shutdown().await;
    tracing::info!("Shutdown complete");
    code
}
