//! # Kontena API Main Entry Point
//!
//! `kontena serve` (default) runs the HTTP API, `kontena migrate` applies
//! pending schema migrations and `kontena config` prints the effective
//! configuration with secrets masked.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kontena::{config::ConfigLoader, db, server::run_server, telemetry};

#[derive(Debug, Parser)]
#[command(name = "kontena", version, about = "Asset and procurement lifecycle service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the loaded configuration (database password redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Config => {
            println!("{}", config.redacted_json()?);
        }
        Commands::Migrate => {
            telemetry::init_tracing(&config)?;
            let db = db::init_pool(&config)
                .await
                .context("initializing database connection pool")?;
            db::run_migrations(&db).await?;
            tracing::info!("Migrations applied");
        }
        Commands::Serve => {
            telemetry::init_tracing(&config)?;
            tracing::info!(profile = %config.profile, "Loaded configuration");

            let db = db::init_pool(&config)
                .await
                .context("initializing database connection pool")?;
            if config.auto_migrate {
                db::run_migrations(&db).await?;
            }

            run_server(config, db).await?;
        }
    }

    Ok(())
}
