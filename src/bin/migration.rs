//! Schema management for the optica database.
//!
//! Reads the same layered configuration as the server; `--database-url`
//! overrides the configured URL.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use optica_api::{config, db, migrator::Migrator};

#[derive(Parser)]
#[command(name = "migration", about = "Apply or inspect optica-api schema migrations", version)]
struct Cli {
    #[arg(long, help = "Database URL; defaults to the configured database_url")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up {
        #[arg(long, help = "Apply at most this many migrations")]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    if let Some(url) = cli.database_url {
        cfg.database_url = url;
    }

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => {
            info!(?steps, "Applying migrations");
            Migrator::up(&pool, steps).await?;
        }
        Command::Down { steps } => {
            info!(steps, "Rolling back migrations");
            Migrator::down(&pool, Some(steps)).await?;
        }
        Command::Status => {
            Migrator::status(&pool).await?;
        }
        Command::Fresh => {
            info!("Dropping all tables and re-applying migrations");
            Migrator::fresh(&pool).await?;
        }
    }

    info!("Migration command completed");
    Ok(())
}
