//! Transparenz Storage Layer
//!
//! Implements the `DocumentStore` trait with two backends:
//!
//! - [`MemoryStore`]: in-memory map, used by tests and short-lived tooling
//! - [`SqliteStore`]: persistent SQLite database
//!
//! Records are immutable once stored; both backends reject a second put of
//! the same record id.
//!
//! # Examples
//!
//! ```
//! use transparenz_store::MemoryStore;
//! use transparenz_domain::traits::{DocumentStore, RecordFilter};
//!
//! let store = MemoryStore::new();
//! let results = store.query(&RecordFilter::default()).unwrap();
//! assert!(results.is_empty());
//! ```

#![warn(missing_docs)]

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid data encountered during (de)serialization
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A record with this id already exists
    #[error("Duplicate record id")]
    Duplicate,
}
