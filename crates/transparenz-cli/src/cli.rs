//! Command-line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ingest municipal documents and answer questions against verified data
#[derive(Debug, Parser)]
#[command(name = "transparenz", version, about)]
pub struct Cli {
    /// Path to the configuration file (defaults to ~/.transparenz/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the document store database (overrides the configuration)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a file or a directory of files into the document store
    Import(ImportArgs),

    /// Ask a question; every claim in the answer is verified against the store
    Query(QueryArgs),

    /// Validate the stored records and print a quality report
    Validate,
}

/// Arguments for the import command
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// File or directory to import
    pub path: PathBuf,

    /// Recurse into subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Files processed concurrently per chunk (1-5)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Per-file timeout in seconds (30-300)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum retries per file (1-5)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Abort the whole job when a file exhausts its retries
    #[arg(long)]
    pub abort_on_failure: bool,

    /// Write the import report to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the query command
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Question in natural language
    pub question: String,

    /// Print the answer as JSON
    #[arg(long)]
    pub json: bool,
}
