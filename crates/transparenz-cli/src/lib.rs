//! Transparenz CLI
//!
//! Command-line interface for the municipal document transparency system:
//! bulk import with live progress, verified natural-language queries and
//! store validation reports.

#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
