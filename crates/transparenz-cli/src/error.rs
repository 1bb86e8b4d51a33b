//! Error types for the CLI

use thiserror::Error;

/// Result alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced to the user as structured messages
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem problem
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ingestion problem
    #[error(transparent)]
    Ingest(#[from] transparenz_ingest::IngestError),

    /// Fact-check problem
    #[error(transparent)]
    FactCheck(#[from] transparenz_factcheck::FactCheckError),

    /// Store problem
    #[error("Store error: {0}")]
    Store(String),

    /// Nothing to do (e.g. no supported files found)
    #[error("{0}")]
    Empty(String),

    /// JSON rendering problem
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}
