//! Lexgraph - knowledge-graph service for legal working sessions

mod auth;
mod error;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexgraph_core::api::LexGraph;
use lexgraph_core::api::health::HealthStatus;
use lexgraph_core::config::Config;
use tracing::info;

#[derive(Parser)]
#[command(name = "lexgraph")]
#[command(author, version, about = "Knowledge-graph service for legal working sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind, overrides server.bind
        #[arg(short, long, env = "LEXGRAPH_BIND")]
        bind: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print the effective configuration
    Show,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lexgraph=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => cmd_serve(bind).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
        Commands::Doctor => cmd_doctor(cli.quiet).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_serve(bind: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    let app = Arc::new(LexGraph::open(config).await?);
    let router = routes::router(app);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(address = %bind, "Lexgraph listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            println!("[!!] Configuration: Error - {:#}", e);
            anyhow::bail!("Health check failed");
        }
    };

    let app = LexGraph::open(config).await?;
    let report = app.health().await;
    if !quiet {
        for check in &report.checks {
            let marker = match check.status {
                HealthStatus::Ok => "OK",
                HealthStatus::Warning => "--",
                HealthStatus::Error => "!!",
            };
            match &check.message {
                Some(message) => println!("[{}] {}: {}", marker, check.name, message),
                None => println!("[{}] {}", marker, check.name),
            }
        }
    }

    if report.is_healthy() {
        if !quiet {
            println!();
            println!("All checks passed.");
        }
        Ok(())
    } else {
        anyhow::bail!("Health check failed")
    }
}
