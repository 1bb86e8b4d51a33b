//! Error types for the ingestion pipeline

use thiserror::Error;
use transparenz_domain::JobId;

/// Errors surfaced by the ingestion service
///
/// Per-file extraction failures are not errors here: they are recorded on
/// the file task and surfaced through the progress interface. These
/// variants cover job-level problems only.
#[derive(Error, Debug)]
pub enum IngestError {
    /// No job with this id is registered
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// The job configuration is outside the documented bounds
    #[error("Invalid job configuration: {0}")]
    InvalidConfig(String),

    /// The submitted batch contains no files
    #[error("Empty batch")]
    EmptyBatch,

    /// The job driver task disappeared without reporting a result
    #[error("Job driver terminated unexpectedly")]
    DriverLost,
}
