//! Transparenz CLI entry point

use anyhow::Context;
use clap::Parser;
use transparenz_cli::{commands, Cli, Command, Config};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load().context("loading configuration")?,
    };

    if let Some(db) = &cli.db {
        config.store_path = db.display().to_string();
    }

    match cli.command {
        Command::Import(args) => commands::execute_import(args, &config).await?,
        Command::Query(args) => commands::execute_query(args, &config).await?,
        Command::Validate => commands::execute_validate(&config).await?,
    }

    Ok(())
}
