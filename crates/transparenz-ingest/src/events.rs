//! Ingestion events
//!
//! Emitted by the job driver for observers such as the quality monitor.
//! Events are advisory; dropping the receiver never stalls ingestion.

use std::time::Duration;
use transparenz_domain::{ExtractErrorKind, JobId, JobStatus, TaskId};

/// Event emitted while a job is processed
#[derive(Debug, Clone)]
pub enum IngestEvent {
    /// A chunk started processing
    ChunkStarted {
        /// Job id
        job_id: JobId,
        /// Zero-based chunk index
        index: usize,
    },

    /// All members of a chunk reached a terminal state
    ChunkFinished {
        /// Job id
        job_id: JobId,
        /// Zero-based chunk index
        index: usize,
    },

    /// A file task reached a terminal state
    FileFinished {
        /// Job id
        job_id: JobId,
        /// Task id
        task_id: TaskId,
        /// Whether extraction succeeded
        success: bool,
        /// Wall-clock time from first attempt to terminal state
        duration: Duration,
        /// Error classification for failures
        error_kind: Option<ExtractErrorKind>,
    },

    /// The job reached a terminal status
    JobFinished {
        /// Job id
        job_id: JobId,
        /// Terminal status
        status: JobStatus,
    },
}
