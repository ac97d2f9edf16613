//! `tagwise`: administer the correction learning engine from a shell.
//!
//! Every command prints JSON on stdout; logs go to stderr.
//!
//! ```text
//! tagwise learn "WOOLWORTHS 1234" --match-type contains --tag Groceries
//! tagwise match "WOOLWORTHS SUPERMARKETS AU"
//! tagwise adjust <id> -0.2
//! ```

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tagwise_learn::CorrectionStore;
use tagwise_storage::SqliteBackend;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "tagwise", version, about = "Correction rules for transaction categorization")]
struct Args {
    /// Path to a TOML config file.
    #[arg(short, long, value_name = "FILE", env = "TAGWISE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database; overrides the config file.
    #[arg(long, value_name = "FILE", env = "TAGWISE_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if args.database.is_some() {
        settings.database = args.database;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = settings.database_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }

    let backend = SqliteBackend::open(&db_path)
        .await
        .with_context(|| format!("opening database {}", db_path.display()))?;
    tracing::debug!("Using correction database {}", db_path.display());
    let store = CorrectionStore::with_policy(backend, settings.learning)?;

    let output = commands::run(&store, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
